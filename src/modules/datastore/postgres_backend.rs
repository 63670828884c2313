use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::postgres::PgListener;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::backend::{BackendKind, Document, StorageBackend};
use super::change_bus::{ChangeBus, Collection};
use super::error::{StorageError, StorageResult};
use super::remote_config::RemoteConfig;
use crate::core::database::create_pool;
use crate::features::reports::models::{NewReport, Report};
use crate::features::users::models::{NewUser, User};

/// Remote document store on Postgres: one JSONB document per row
pub struct PostgresBackend {
    pool: PgPool,
    retry_interval: Duration,
}

impl PostgresBackend {
    /// Open the pool and bring the collection schema up to date
    pub async fn connect(config: &RemoteConfig, retry_interval: Duration) -> StorageResult<Self> {
        let pool = create_pool(config).await.map_err(|e| {
            tracing::error!(
                "Failed to connect to remote store {}: {:?}",
                config.redacted_url(),
                e
            );
            StorageError::Remote(e)
        })?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        tracing::info!("Connected to remote store {}", config.redacted_url());

        Ok(Self {
            pool,
            retry_interval,
        })
    }

    async fn load<T: DeserializeOwned>(&self, collection: Collection) -> StorageResult<Vec<T>> {
        let sql = format!("SELECT id, data FROM {}", collection.name());
        let rows: Vec<(String, Value)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load {}: {:?}", collection.name(), e);
                StorageError::Remote(e)
            })?;

        let mut items = Vec::with_capacity(rows.len());
        for (id, data) in rows {
            let document = Document {
                collection,
                id,
                data,
            };
            let id = document.id.clone();
            match document.into_entity() {
                Ok(item) => items.push(item),
                // One malformed document must not hide the rest of the feed
                Err(e) => tracing::warn!(
                    "Skipping malformed {} document {}: {}",
                    collection.name(),
                    id,
                    e
                ),
            }
        }
        Ok(items)
    }

    async fn insert(&self, document: &Document) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO {} (id, data) VALUES ($1, $2)",
            document.collection.name()
        );
        sqlx::query(&sql)
            .bind(&document.id)
            .bind(&document.data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to insert {} document: {:?}",
                    document.collection.name(),
                    e
                );
                StorageError::Remote(e)
            })?;
        Ok(())
    }

    async fn merge(&self, document: &Document) -> StorageResult<()> {
        sqlx::query(&merge_sql(document.collection))
            .bind(&document.id)
            .bind(&document.data)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to merge {} document {}: {:?}",
                    document.collection.name(),
                    document.id,
                    e
                );
                StorageError::Remote(e)
            })?;
        Ok(())
    }
}

/// Upsert that merges top-level fields into an existing document
fn merge_sql(collection: Collection) -> String {
    format!(
        "INSERT INTO {table} (id, data) VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET data = {table}.data || EXCLUDED.data, updated_at = NOW()",
        table = collection.name()
    )
}

#[async_trait]
impl StorageBackend for PostgresBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn load_reports(&self) -> StorageResult<Vec<Report>> {
        let mut reports: Vec<Report> = self.load(Collection::Reports).await?;
        reports.sort_by(|a, b| b.maintenance_date.cmp(&a.maintenance_date));
        Ok(reports)
    }

    async fn load_users(&self) -> StorageResult<Vec<User>> {
        self.load(Collection::Users).await
    }

    async fn insert_report(&self, report: NewReport) -> StorageResult<Report> {
        let report = report.with_id(Uuid::new_v4().to_string());
        self.insert(&Document::from_entity(Collection::Reports, &report)?)
            .await?;
        Ok(report)
    }

    async fn update_report(&self, report: &Report) -> StorageResult<bool> {
        self.merge(&Document::from_entity(Collection::Reports, report)?)
            .await?;
        Ok(true)
    }

    async fn delete_reports(&self, ids: &[String]) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM reports WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete reports: {:?}", e);
                StorageError::Remote(e)
            })?;
        Ok(result.rows_affected() as usize)
    }

    async fn insert_user(&self, user: NewUser) -> StorageResult<User> {
        let user = user.with_id(Uuid::new_v4().to_string());
        self.insert(&Document::from_entity(Collection::Users, &user)?)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StorageResult<bool> {
        self.merge(&Document::from_entity(Collection::Users, user)?)
            .await?;
        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete user {}: {:?}", id, e);
                StorageError::Remote(e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    fn spawn_watcher(self: Arc<Self>, bus: ChangeBus) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match listen(&self.pool, &bus).await {
                    Ok(()) => return,
                    Err(e) => {
                        tracing::warn!(
                            "Remote change listener failed, retrying in {:?}: {}",
                            self.retry_interval,
                            e
                        );
                    }
                }
                // Subscribers refetch, which falls back to the local snapshot while down
                for collection in Collection::ALL {
                    bus.publish(collection);
                }
                tokio::time::sleep(self.retry_interval).await;
            }
        })
    }

    async fn test_connection(&self) -> StorageResult<()> {
        sqlx::query("SELECT id FROM reports LIMIT 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Remote connection test failed: {:?}", e);
                StorageError::Remote(e)
            })?;
        Ok(())
    }

    async fn merge_batch(&self, batch: &[Document]) -> StorageResult<()> {
        let mut tx = self.pool.begin().await?;
        for document in batch {
            sqlx::query(&merge_sql(document.collection))
                .bind(&document.id)
                .bind(&document.data)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Closed remote store connection pool");
    }
}

/// Forward trigger notifications into the bus until the listener fails
async fn listen(pool: &PgPool, bus: &ChangeBus) -> StorageResult<()> {
    let mut listener = PgListener::connect_with(pool).await?;
    let channels: Vec<&str> = Collection::ALL.iter().map(|c| c.channel()).collect();
    listener.listen_all(channels).await?;

    tracing::debug!("Listening for remote collection changes");

    loop {
        let notification = listener.recv().await?;
        match Collection::from_channel(notification.channel()) {
            Some(collection) => bus.publish(collection),
            None => tracing::trace!(
                "Ignoring notification on channel {}",
                notification.channel()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_sql_targets_collection_table() {
        let sql = merge_sql(Collection::Users);
        assert!(sql.starts_with("INSERT INTO users (id, data)"));
        assert!(sql.contains("data = users.data || EXCLUDED.data"));
    }
}
