use thiserror::Error;

/// Errors raised by the data-access layer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Local storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode or decode stored data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Remote store error: {0}")]
    Remote(#[from] sqlx::Error),

    #[error("Remote store migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not connected to the remote store")]
    NotConnected,

    #[error("Invalid remote configuration: {0}")]
    InvalidConfig(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

impl StorageError {
    /// True when the remote store rejected a write on a unique index
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Remote(sqlx::Error::Database(db)) => db.is_unique_violation(),
            _ => false,
        }
    }
}
