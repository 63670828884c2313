use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::task::JoinHandle;

use super::change_bus::{ChangeBus, Collection};
use super::error::{StorageError, StorageResult};
use crate::features::reports::models::{NewReport, Report};
use crate::features::users::models::{NewUser, User};

/// Which kind of store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    Remote,
}

/// A record as the document store sees it: an id plus the remaining fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: Collection,
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Split an entity into its id and a field object without the id
    pub fn from_entity<T: Serialize>(collection: Collection, entity: &T) -> StorageResult<Self> {
        let mut data = serde_json::to_value(entity)?;
        let id = match data.as_object_mut().and_then(|obj| obj.remove("id")) {
            Some(Value::String(id)) => id,
            _ => {
                return Err(StorageError::Serialization(serde::de::Error::custom(
                    "entity has no string id",
                )))
            }
        };
        Ok(Self {
            collection,
            id,
            data,
        })
    }

    /// Rebuild an entity from a stored id and field object
    pub fn into_entity<T: DeserializeOwned>(self) -> StorageResult<T> {
        let mut data = self.data;
        if let Some(obj) = data.as_object_mut() {
            obj.insert("id".to_string(), Value::String(self.id));
        }
        Ok(serde_json::from_value(data)?)
    }
}

/// Storage backend behind the data-access service.
///
/// Exactly one implementation is active at a time; it is chosen when the service
/// is constructed or reloaded, never per call.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    async fn load_reports(&self) -> StorageResult<Vec<Report>>;

    async fn load_users(&self) -> StorageResult<Vec<User>>;

    async fn insert_report(&self, report: NewReport) -> StorageResult<Report>;

    /// Replace (local) or merge (remote) a report. Returns false when nothing was written.
    async fn update_report(&self, report: &Report) -> StorageResult<bool>;

    /// Returns the number of removed reports
    async fn delete_reports(&self, ids: &[String]) -> StorageResult<usize>;

    async fn insert_user(&self, user: NewUser) -> StorageResult<User>;

    async fn update_user(&self, user: &User) -> StorageResult<bool>;

    async fn delete_user(&self, id: &str) -> StorageResult<bool>;

    /// Start forwarding changes made outside this process into the bus
    fn spawn_watcher(self: Arc<Self>, bus: ChangeBus) -> JoinHandle<()>;

    /// Minimal bounded read against the store
    async fn test_connection(&self) -> StorageResult<()> {
        Err(StorageError::NotConnected)
    }

    /// Merge-write a batch of documents in one transaction
    async fn merge_batch(&self, _batch: &[Document]) -> StorageResult<()> {
        Err(StorageError::NotConnected)
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::users::models::UserRole;

    #[test]
    fn test_document_round_trip_keeps_id_out_of_data() {
        let user = User {
            id: "user-7".to_string(),
            username: "bank".to_string(),
            password: "hash".to_string(),
            role: UserRole::Bank,
            name: "Bank Viewer".to_string(),
        };

        let doc = Document::from_entity(Collection::Users, &user).unwrap();
        assert_eq!(doc.id, "user-7");
        assert!(doc.data.get("id").is_none());
        assert_eq!(doc.data["role"], "bank");

        let restored: User = doc.into_entity().unwrap();
        assert_eq!(restored, user);
    }
}
