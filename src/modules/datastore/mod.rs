//! Data access over a local document store or a remote Postgres document store.

mod backend;
mod change_bus;
mod error;
mod local_backend;
mod local_store;
mod postgres_backend;
mod remote_config;
pub mod seed;
mod service;

pub use change_bus::Collection;
pub use error::{StorageError, StorageResult};
pub use local_store::LocalStore;
pub use remote_config::RemoteConfig;
pub use service::{DatabaseService, DatastoreSettings, Subscription, SyncSummary};
