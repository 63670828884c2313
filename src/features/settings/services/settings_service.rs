use std::sync::Arc;

use crate::core::error::Result;
use crate::features::settings::dtos::{DatabaseStatusDto, SaveDatabaseConfigDto};
use crate::modules::datastore::{DatabaseService, SyncSummary};

/// Admin management of the remote database connection
pub struct SettingsService {
    db: Arc<DatabaseService>,
}

impl SettingsService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self { db }
    }

    pub async fn status(&self) -> Result<DatabaseStatusDto> {
        let config = self.db.current_config().await?;
        Ok(DatabaseStatusDto::new(
            self.db.is_remote().await,
            config.as_ref(),
        ))
    }

    /// Persist the configuration and reconnect. An unreachable database leaves the
    /// service in local mode, which the returned status reflects.
    pub async fn save(&self, dto: SaveDatabaseConfigDto) -> Result<DatabaseStatusDto> {
        let config = dto.into_config()?;
        self.db.save_config(config).await?;
        self.status().await
    }

    pub async fn clear(&self) -> Result<DatabaseStatusDto> {
        self.db.clear_config().await?;
        self.status().await
    }

    pub async fn test_connection(&self) -> Result<()> {
        self.db.test_connection().await?;
        Ok(())
    }

    pub async fn sync(&self) -> Result<SyncSummary> {
        Ok(self.db.sync_local_to_remote().await?)
    }
}
