use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::backend::{BackendKind, StorageBackend};
use super::change_bus::{ChangeBus, Collection};
use super::error::StorageResult;
use super::local_store::LocalStore;
use super::seed;
use crate::features::reports::models::{NewReport, Report};
use crate::features::users::models::{NewUser, User};

/// Backend over the on-disk key-value store
pub struct LocalBackend {
    store: Arc<LocalStore>,
    poll_interval: Duration,
}

impl LocalBackend {
    pub fn new(store: Arc<LocalStore>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
        }
    }

    /// Write the demo users and reports for any collection key that does not exist yet
    pub async fn seed_if_absent(&self) -> StorageResult<()> {
        let _guard = self.store.lock().await;

        if !self.store.contains(Collection::Reports.storage_key()).await? {
            self.store
                .put(Collection::Reports.storage_key(), &seed::demo_reports())
                .await?;
            tracing::info!("Seeded demo reports into local store");
        }
        if !self.store.contains(Collection::Users.storage_key()).await? {
            self.store
                .put(Collection::Users.storage_key(), &seed::demo_users())
                .await?;
            tracing::info!("Seeded demo users into local store");
        }
        Ok(())
    }

    async fn read_reports(&self) -> StorageResult<Vec<Report>> {
        Ok(self
            .store
            .get(Collection::Reports.storage_key())
            .await?
            .unwrap_or_default())
    }

    async fn read_users(&self) -> StorageResult<Vec<User>> {
        Ok(self
            .store
            .get(Collection::Users.storage_key())
            .await?
            .unwrap_or_default())
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn load_reports(&self) -> StorageResult<Vec<Report>> {
        self.read_reports().await
    }

    async fn load_users(&self) -> StorageResult<Vec<User>> {
        self.read_users().await
    }

    async fn insert_report(&self, report: NewReport) -> StorageResult<Report> {
        let _guard = self.store.lock().await;

        let mut reports = self.read_reports().await?;
        let report = report.with_id(format!("report-{}", Uuid::now_v7()));
        // Newest first
        reports.insert(0, report.clone());
        self.store
            .put(Collection::Reports.storage_key(), &reports)
            .await?;

        Ok(report)
    }

    async fn update_report(&self, report: &Report) -> StorageResult<bool> {
        let _guard = self.store.lock().await;

        let mut reports = self.read_reports().await?;
        let Some(slot) = reports.iter_mut().find(|r| r.id == report.id) else {
            return Ok(false);
        };
        *slot = report.clone();
        self.store
            .put(Collection::Reports.storage_key(), &reports)
            .await?;

        Ok(true)
    }

    async fn delete_reports(&self, ids: &[String]) -> StorageResult<usize> {
        let _guard = self.store.lock().await;

        let mut reports = self.read_reports().await?;
        let before = reports.len();
        reports.retain(|r| !ids.contains(&r.id));
        let removed = before - reports.len();

        if removed > 0 {
            self.store
                .put(Collection::Reports.storage_key(), &reports)
                .await?;
        }
        Ok(removed)
    }

    async fn insert_user(&self, user: NewUser) -> StorageResult<User> {
        let _guard = self.store.lock().await;

        let mut users = self.read_users().await?;
        let user = user.with_id(format!("user-{}", Uuid::now_v7()));
        users.push(user.clone());
        self.store
            .put(Collection::Users.storage_key(), &users)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, user: &User) -> StorageResult<bool> {
        let _guard = self.store.lock().await;

        let mut users = self.read_users().await?;
        let Some(slot) = users.iter_mut().find(|u| u.id == user.id) else {
            return Ok(false);
        };
        *slot = user.clone();
        self.store
            .put(Collection::Users.storage_key(), &users)
            .await?;

        Ok(true)
    }

    async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        let _guard = self.store.lock().await;

        let mut users = self.read_users().await?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Ok(false);
        }
        self.store
            .put(Collection::Users.storage_key(), &users)
            .await?;

        Ok(true)
    }

    fn spawn_watcher(self: Arc<Self>, bus: ChangeBus) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            tracing::debug!(
                "Local change watcher started (interval {:?})",
                self.poll_interval
            );

            loop {
                ticker.tick().await;

                // Holding the write lock keeps our own in-flight writes out of the comparison
                let _guard = self.store.lock().await;
                for collection in Collection::ALL {
                    match self.store.changed_externally(collection.storage_key()).await {
                        Ok(true) => {
                            tracing::debug!(
                                "Local {} changed outside this process",
                                collection.name()
                            );
                            bus.publish(collection);
                        }
                        Ok(false) => {}
                        Err(e) => {
                            tracing::warn!(
                                "Failed to check local {} for changes: {}",
                                collection.name(),
                                e
                            );
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::sample_new_report;
    use crate::features::users::models::UserRole;

    async fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path()).await.unwrap());
        (dir, LocalBackend::new(store, Duration::from_secs(1)))
    }

    #[tokio::test]
    async fn test_insert_report_prepends_with_local_id() {
        let (_dir, backend) = backend().await;

        let first = backend.insert_report(sample_new_report()).await.unwrap();
        let second = backend.insert_report(sample_new_report()).await.unwrap();

        assert!(first.id.starts_with("report-"));
        assert_ne!(first.id, second.id);

        let reports = backend.load_reports().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, second.id);
    }

    #[tokio::test]
    async fn test_update_unknown_report_is_noop() {
        let (_dir, backend) = backend().await;
        let stored = backend.insert_report(sample_new_report()).await.unwrap();

        let ghost = sample_new_report().with_id("report-missing".to_string());
        assert!(!backend.update_report(&ghost).await.unwrap());

        let mut edited = stored.clone();
        edited.notes = "Rechecked".to_string();
        assert!(backend.update_report(&edited).await.unwrap());

        let reports = backend.load_reports().await.unwrap();
        assert_eq!(reports, vec![edited]);
    }

    #[tokio::test]
    async fn test_delete_reports_counts_removed() {
        let (_dir, backend) = backend().await;
        let a = backend.insert_report(sample_new_report()).await.unwrap();
        let b = backend.insert_report(sample_new_report()).await.unwrap();

        let removed = backend
            .delete_reports(&[a.id.clone(), "report-missing".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(backend.load_reports().await.unwrap(), vec![b]);
    }

    #[tokio::test]
    async fn test_users_append_and_delete() {
        let (_dir, backend) = backend().await;
        let alice = backend
            .insert_user(NewUser {
                username: "alice".to_string(),
                password: "x".to_string(),
                role: UserRole::Admin,
                name: "Alice".to_string(),
            })
            .await
            .unwrap();
        let bob = backend
            .insert_user(NewUser {
                username: "bob".to_string(),
                password: "y".to_string(),
                role: UserRole::Bank,
                name: "Bob".to_string(),
            })
            .await
            .unwrap();

        let users = backend.load_users().await.unwrap();
        assert_eq!(users, vec![alice.clone(), bob.clone()]);

        assert!(backend.delete_user(&alice.id).await.unwrap());
        assert!(!backend.delete_user(&alice.id).await.unwrap());
        assert_eq!(backend.load_users().await.unwrap(), vec![bob]);
    }

    #[tokio::test]
    async fn test_seed_only_fills_absent_keys() {
        let (_dir, backend) = backend().await;
        backend.insert_report(sample_new_report()).await.unwrap();

        backend.seed_if_absent().await.unwrap();

        // Existing reports untouched, users seeded
        assert_eq!(backend.load_reports().await.unwrap().len(), 1);
        let users = backend.load_users().await.unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["admin", "bank"]);
    }

    #[tokio::test]
    async fn test_local_mode_has_no_remote_operations() {
        let (_dir, backend) = backend().await;
        assert!(backend.test_connection().await.is_err());
        assert!(backend.merge_batch(&[]).await.is_err());
    }
}
