use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::backend::{BackendKind, Document, StorageBackend};
use super::change_bus::{ChangeBus, Collection};
use super::error::{StorageError, StorageResult};
use super::local_backend::LocalBackend;
use super::local_store::LocalStore;
use super::postgres_backend::PostgresBackend;
use super::remote_config::{RemoteConfig, REMOTE_CONFIG_KEY};
use crate::features::reports::models::{NewReport, Report};
use crate::features::users::models::{NewUser, User};
use crate::shared::constants::SYNC_BATCH_SIZE;

#[derive(Debug, Clone)]
pub struct DatastoreSettings {
    /// Local watcher interval, also the retry delay of the remote listener
    pub poll_interval: Duration,
    pub seed_demo_data: bool,
}

/// Outcome of pushing the local collections to the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SyncSummary {
    pub reports: usize,
    pub users: usize,
    pub batches: usize,
}

/// Live feed registration. Dropping it stops delivery.
#[must_use = "dropping a Subscription stops delivery"]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Single data-access entry point over whichever backend is active.
///
/// Every write that goes through here is announced on the change bus, so all
/// subscribers (in this process) see it regardless of backend.
pub struct DatabaseService {
    store: Arc<LocalStore>,
    local: Arc<LocalBackend>,
    backend: RwLock<Arc<dyn StorageBackend>>,
    bus: ChangeBus,
    watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
    reload_lock: Mutex<()>,
    settings: DatastoreSettings,
}

impl DatabaseService {
    pub async fn init(store: Arc<LocalStore>, settings: DatastoreSettings) -> StorageResult<Arc<Self>> {
        let local = Arc::new(LocalBackend::new(store.clone(), settings.poll_interval));
        let backend = select_backend(&store, &local, &settings).await?;

        let service = Arc::new(Self {
            store,
            local,
            backend: RwLock::new(backend),
            bus: ChangeBus::new(),
            watcher: std::sync::Mutex::new(None),
            reload_lock: Mutex::new(()),
            settings,
        });
        service.start_watcher().await;

        tracing::info!(
            "Data access initialized in {} mode",
            if service.is_remote().await { "remote" } else { "local" }
        );

        Ok(service)
    }

    /// Service over an explicit backend, bypassing configuration lookup
    #[cfg(test)]
    pub(crate) async fn with_backend(
        store: Arc<LocalStore>,
        backend: Arc<dyn StorageBackend>,
        settings: DatastoreSettings,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            local: Arc::new(LocalBackend::new(store.clone(), settings.poll_interval)),
            store,
            backend: RwLock::new(backend),
            bus: ChangeBus::new(),
            watcher: std::sync::Mutex::new(None),
            reload_lock: Mutex::new(()),
            settings,
        });
        service.start_watcher().await;
        service
    }

    pub async fn shutdown(&self) {
        self.stop_watcher();
        self.backend().await.close().await;
        tracing::info!("Data access shut down");
    }

    pub async fn is_remote(&self) -> bool {
        self.backend().await.kind() == BackendKind::Remote
    }

    // Subscriptions

    pub fn subscribe_reports<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(Vec<Report>) + Send + Sync + 'static,
    {
        self.subscribe(callback)
    }

    pub fn subscribe_users<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(Vec<User>) + Send + Sync + 'static,
    {
        self.subscribe(callback)
    }

    fn subscribe<T, F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        T: Snapshot,
        F: Fn(Vec<T>) + Send + Sync + 'static,
    {
        // Receiver exists before the task starts, so no publish after this call is missed
        let mut rx = self.bus.subscribe();
        let service = Arc::clone(self);

        let handle = tokio::spawn(async move {
            service.deliver(&callback).await;
            loop {
                match rx.recv().await {
                    Ok(collection) if collection == T::COLLECTION => {
                        service.deliver(&callback).await
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(
                            "{} subscriber lagged by {} notifications, refetching",
                            T::COLLECTION.name(),
                            skipped
                        );
                        service.deliver(&callback).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { handle }
    }

    async fn deliver<T: Snapshot>(&self, callback: &(impl Fn(Vec<T>) + Send + Sync)) {
        match T::snapshot(self).await {
            Ok(items) => callback(items),
            Err(e) => tracing::error!(
                "Failed to read {} for subscribers: {}",
                T::COLLECTION.name(),
                e
            ),
        }
    }

    // Reads

    /// Current reports. A failing remote read falls back to the local snapshot.
    pub async fn fetch_reports(&self) -> StorageResult<Vec<Report>> {
        let backend = self.backend().await;
        match backend.load_reports().await {
            Ok(reports) => Ok(reports),
            Err(e) if backend.kind() == BackendKind::Remote => {
                tracing::warn!("Remote reports read failed, serving local snapshot: {}", e);
                self.local.load_reports().await
            }
            Err(e) => Err(e),
        }
    }

    /// Current users. A failing remote read falls back to the local snapshot.
    pub async fn fetch_users(&self) -> StorageResult<Vec<User>> {
        let backend = self.backend().await;
        match backend.load_users().await {
            Ok(users) => Ok(users),
            Err(e) if backend.kind() == BackendKind::Remote => {
                tracing::warn!("Remote users read failed, serving local snapshot: {}", e);
                self.local.load_users().await
            }
            Err(e) => Err(e),
        }
    }

    // Report writes

    pub async fn add_report(&self, report: NewReport) -> StorageResult<Report> {
        let report = self.backend().await.insert_report(report).await?;
        self.bus.publish(Collection::Reports);
        Ok(report)
    }

    /// Add reports one after another and notify once at the end
    pub async fn add_reports(&self, reports: Vec<NewReport>) -> StorageResult<Vec<Report>> {
        let backend = self.backend().await;
        let mut added = Vec::with_capacity(reports.len());

        for report in reports {
            match backend.insert_report(report).await {
                Ok(report) => added.push(report),
                Err(e) => {
                    if !added.is_empty() {
                        self.bus.publish(Collection::Reports);
                    }
                    return Err(e);
                }
            }
        }

        self.bus.publish(Collection::Reports);
        Ok(added)
    }

    /// Returns false when the active backend had no such report
    pub async fn update_report(&self, report: &Report) -> StorageResult<bool> {
        let updated = self.backend().await.update_report(report).await?;
        if updated {
            self.bus.publish(Collection::Reports);
        }
        Ok(updated)
    }

    pub async fn delete_reports(&self, ids: &[String]) -> StorageResult<usize> {
        let removed = self.backend().await.delete_reports(ids).await?;
        self.bus.publish(Collection::Reports);
        Ok(removed)
    }

    // User writes

    pub async fn add_user(&self, user: NewUser) -> StorageResult<User> {
        let user = self.backend().await.insert_user(user).await?;
        self.bus.publish(Collection::Users);
        Ok(user)
    }

    pub async fn update_user(&self, user: &User) -> StorageResult<bool> {
        let updated = self.backend().await.update_user(user).await?;
        if updated {
            self.bus.publish(Collection::Users);
        }
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> StorageResult<bool> {
        let deleted = self.backend().await.delete_user(id).await?;
        if deleted {
            self.bus.publish(Collection::Users);
        }
        Ok(deleted)
    }

    // Remote store management

    /// Push every locally stored report and user to the remote store, keeping
    /// their local ids. Stops at the first failing batch; earlier batches stay.
    pub async fn sync_local_to_remote(&self) -> StorageResult<SyncSummary> {
        let backend = self.backend().await;
        if backend.kind() != BackendKind::Remote {
            return Err(StorageError::NotConnected);
        }

        let reports = self.local.load_reports().await?;
        let users = self.local.load_users().await?;

        let mut documents = Vec::with_capacity(reports.len() + users.len());
        for report in &reports {
            documents.push(Document::from_entity(Collection::Reports, report)?);
        }
        for user in &users {
            documents.push(Document::from_entity(Collection::Users, user)?);
        }

        let total_batches = documents.len().div_ceil(SYNC_BATCH_SIZE);
        let mut batches = 0;
        for batch in documents.chunks(SYNC_BATCH_SIZE) {
            backend.merge_batch(batch).await.map_err(|e| {
                tracing::error!(
                    "Sync aborted at batch {} of {}: {}",
                    batches + 1,
                    total_batches,
                    e
                );
                e
            })?;
            batches += 1;
        }

        tracing::info!(
            "Synced {} reports and {} users to remote store in {} batches",
            reports.len(),
            users.len(),
            batches
        );

        if batches > 0 {
            for collection in Collection::ALL {
                self.bus.publish(collection);
            }
        }

        Ok(SyncSummary {
            reports: reports.len(),
            users: users.len(),
            batches,
        })
    }

    pub async fn test_connection(&self) -> StorageResult<()> {
        self.backend().await.test_connection().await
    }

    pub async fn current_config(&self) -> StorageResult<Option<RemoteConfig>> {
        self.store.get(REMOTE_CONFIG_KEY).await
    }

    /// Persist a remote configuration and switch to it
    pub async fn save_config(&self, config: RemoteConfig) -> StorageResult<()> {
        config.validate()?;
        self.store.put(REMOTE_CONFIG_KEY, &config).await?;
        tracing::info!("Saved remote configuration for {}", config.redacted_url());
        self.reload().await
    }

    /// Forget the remote configuration and return to local mode
    pub async fn clear_config(&self) -> StorageResult<()> {
        self.store.remove(REMOTE_CONFIG_KEY).await?;
        tracing::info!("Cleared remote configuration");
        self.reload().await
    }

    /// Re-select the backend from the stored configuration and re-notify every subscriber
    pub async fn reload(&self) -> StorageResult<()> {
        let _guard = self.reload_lock.lock().await;

        self.stop_watcher();
        let next = select_backend(&self.store, &self.local, &self.settings).await?;
        let previous = std::mem::replace(&mut *self.backend.write().await, next);
        previous.close().await;
        self.start_watcher().await;

        for collection in Collection::ALL {
            self.bus.publish(collection);
        }

        tracing::info!(
            "Data access reloaded in {} mode",
            if self.is_remote().await { "remote" } else { "local" }
        );
        Ok(())
    }

    async fn backend(&self) -> Arc<dyn StorageBackend> {
        self.backend.read().await.clone()
    }

    async fn start_watcher(&self) {
        let handle = self.backend().await.spawn_watcher(self.bus.clone());
        let previous = self
            .watcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn stop_watcher(&self) {
        let handle = self
            .watcher
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}

/// Remote when a stored configuration connects, local otherwise
async fn select_backend(
    store: &LocalStore,
    local: &Arc<LocalBackend>,
    settings: &DatastoreSettings,
) -> StorageResult<Arc<dyn StorageBackend>> {
    match store.get::<RemoteConfig>(REMOTE_CONFIG_KEY).await {
        Ok(Some(config)) => {
            match PostgresBackend::connect(&config, settings.poll_interval).await {
                Ok(remote) => return Ok(Arc::new(remote)),
                Err(e) => {
                    tracing::error!("Remote store unavailable, using local storage: {}", e);
                    return Ok(local.clone());
                }
            }
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Ignoring unreadable remote configuration: {}", e);
        }
    }

    if settings.seed_demo_data {
        local.seed_if_absent().await?;
    }
    Ok(local.clone())
}

/// Collection element that can be read as a full snapshot
#[async_trait]
trait Snapshot: Sized + Send + 'static {
    const COLLECTION: Collection;

    async fn snapshot(service: &DatabaseService) -> StorageResult<Vec<Self>>;
}

#[async_trait]
impl Snapshot for Report {
    const COLLECTION: Collection = Collection::Reports;

    async fn snapshot(service: &DatabaseService) -> StorageResult<Vec<Self>> {
        service.fetch_reports().await
    }
}

#[async_trait]
impl Snapshot for User {
    const COLLECTION: Collection = Collection::Users;

    async fn snapshot(service: &DatabaseService) -> StorageResult<Vec<Self>> {
        service.fetch_users().await
    }
}
