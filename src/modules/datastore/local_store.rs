use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, MutexGuard};

use super::error::StorageResult;

/// Key-value document store on the local filesystem.
///
/// Each key is one JSON file under the root directory. Writes go to a temporary
/// file first and are renamed into place, so readers never see a torn document.
/// The store remembers a fingerprint of every document it wrote itself, which
/// lets the poll watcher tell its own writes apart from writes by other processes.
#[derive(Debug)]
pub struct LocalStore {
    root: PathBuf,
    fingerprints: std::sync::Mutex<HashMap<String, Option<String>>>,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub async fn open(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        tracing::debug!("Opened local store at {}", root.display());

        Ok(Self {
            root,
            fingerprints: std::sync::Mutex::new(HashMap::new()),
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serialize read-modify-write sequences across tasks
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.read_raw(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let path = self.path_for(key);
        let tmp = self.root.join(format!(".{}.{}.tmp", key, uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        self.remember(key, Some(fingerprint(&bytes)));
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.remember(key, None);
        Ok(())
    }

    pub async fn contains(&self, key: &str) -> StorageResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }

    /// True when the document under `key` differs from what this store last
    /// wrote or observed. The current state is recorded as observed.
    pub async fn changed_externally(&self, key: &str) -> StorageResult<bool> {
        let current = self.read_raw(key).await?.map(|bytes| fingerprint(&bytes));

        let mut fingerprints = self
            .fingerprints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match fingerprints.get(key) {
            Some(known) if *known == current => Ok(false),
            Some(_) => {
                fingerprints.insert(key.to_string(), current);
                Ok(true)
            }
            None => {
                // First observation sets the baseline
                fingerprints.insert(key.to_string(), current);
                Ok(false)
            }
        }
    }

    async fn read_raw(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn remember(&self, key: &str, value: Option<String>) {
        self.fingerprints
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
