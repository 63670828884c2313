use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::modules::datastore::{RemoteConfig, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Local,
    Remote,
}

/// Where data currently lives and what is configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DatabaseStatusDto {
    pub mode: StorageMode,
    pub configured: bool,
    /// Credentials masked
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
}

impl DatabaseStatusDto {
    pub fn new(remote: bool, config: Option<&RemoteConfig>) -> Self {
        Self {
            mode: if remote {
                StorageMode::Remote
            } else {
                StorageMode::Local
            },
            configured: config.is_some(),
            database_url: config.map(RemoteConfig::redacted_url),
            max_connections: config.map(|c| c.max_connections),
        }
    }
}

/// Remote connection parameters, either as fields or as a pasted JSON blob.
/// `raw` wins when both are present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveDatabaseConfigDto {
    /// JSON object such as `{"database_url": "postgres://..."}`
    pub raw: Option<String>,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub max_lifetime_secs: Option<u64>,
}

impl SaveDatabaseConfigDto {
    pub fn into_config(self) -> StorageResult<RemoteConfig> {
        if let Some(raw) = self.raw.as_deref().filter(|r| !r.trim().is_empty()) {
            return RemoteConfig::parse(raw);
        }

        let url = self
            .database_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| StorageError::InvalidConfig("database_url is required".to_string()))?;

        let mut config = RemoteConfig::new(url.trim());
        if let Some(v) = self.max_connections {
            config.max_connections = v;
        }
        if let Some(v) = self.min_connections {
            config.min_connections = v;
        }
        if let Some(v) = self.acquire_timeout_secs {
            config.acquire_timeout_secs = v;
        }
        if let Some(v) = self.idle_timeout_secs {
            config.idle_timeout_secs = v;
        }
        if let Some(v) = self.max_lifetime_secs {
            config.max_lifetime_secs = v;
        }
        config.validate()?;
        Ok(config)
    }
}
