use std::sync::Arc;

use tokio::sync::Mutex;

use crate::core::error::{AppError, Result};
use crate::features::auth::password::hash_password;
use crate::features::users::dtos::{CreateUserDto, UpdateUserDto, UserDto};
use crate::features::users::models::{NewUser, User};
use crate::modules::datastore::{DatabaseService, StorageError, Subscription};

/// Service for user account management
pub struct UserService {
    db: Arc<DatabaseService>,
    /// Held from the username check until the write lands
    write_lock: Mutex<()>,
}

fn username_taken(username: &str) -> AppError {
    AppError::Conflict(format!("Username '{}' is already taken", username))
}

fn map_write_error(e: StorageError, username: &str) -> AppError {
    if e.is_unique_violation() {
        username_taken(username)
    } else {
        AppError::Storage(e)
    }
}

impl UserService {
    pub fn new(db: Arc<DatabaseService>) -> Self {
        Self {
            db,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> Result<Vec<UserDto>> {
        let users = self.db.fetch_users().await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let users = self.db.fetch_users().await?;
        Ok(users.into_iter().find(|u| u.username == username))
    }

    /// Create a user with a unique username. The collection is untouched on conflict.
    pub async fn create(&self, dto: CreateUserDto) -> Result<UserDto> {
        let _guard = self.write_lock.lock().await;

        if self.find_by_username(&dto.username).await?.is_some() {
            return Err(username_taken(&dto.username));
        }

        let user = self
            .db
            .add_user(NewUser {
                username: dto.username.clone(),
                password: hash_password(&dto.password),
                role: dto.role,
                name: dto.name,
            })
            .await
            .map_err(|e| map_write_error(e, &dto.username))?;

        tracing::info!("Created user {} ({})", user.username, user.role);
        Ok(user.into())
    }

    pub async fn update(&self, id: &str, dto: UpdateUserDto) -> Result<UserDto> {
        let _guard = self.write_lock.lock().await;
        let users = self.db.fetch_users().await?;

        let existing = users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        if users
            .iter()
            .any(|u| u.id != id && u.username == dto.username)
        {
            return Err(username_taken(&dto.username));
        }

        let user = User {
            id: existing.id.clone(),
            username: dto.username,
            password: match dto.password {
                Some(password) => hash_password(&password),
                None => existing.password.clone(),
            },
            role: dto.role,
            name: dto.name,
        };

        let updated = self
            .db
            .update_user(&user)
            .await
            .map_err(|e| map_write_error(e, &user.username))?;
        if !updated {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        tracing::info!("Updated user {}", user.id);
        Ok(user.into())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.db.delete_user(id).await? {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }
        tracing::info!("Deleted user {}", id);
        Ok(())
    }

    /// Live feed of the user list, passwords stripped
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Vec<UserDto>) + Send + Sync + 'static,
    {
        self.db
            .subscribe_users(move |users| callback(users.into_iter().map(UserDto::from).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::password::verify_password;
    use crate::features::users::models::UserRole;
    use crate::shared::test_helpers::local_database;

    fn create_dto(username: &str) -> CreateUserDto {
        CreateUserDto {
            name: "Viewer".to_string(),
            username: username.to_string(),
            password: "secret1".to_string(),
            role: UserRole::Bank,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_username() {
        let (_dir, db) = local_database().await;
        let service = UserService::new(db.clone());

        service.create(create_dto("viewer")).await.unwrap();
        let err = service.create(create_dto("viewer")).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(db.fetch_users().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_store_one_user() {
        let (_dir, db) = local_database().await;
        let service = Arc::new(UserService::new(db.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.create(create_dto("viewer")).await })
            })
            .collect();

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::Conflict(_)) => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
        let stored = db.fetch_users().await.unwrap();
        assert_eq!(stored.iter().filter(|u| u.username == "viewer").count(), 1);
    }

    #[tokio::test]
    async fn test_create_stores_hashed_password() {
        let (_dir, db) = local_database().await;
        let service = UserService::new(db.clone());

        service.create(create_dto("viewer")).await.unwrap();

        let stored = &db.fetch_users().await.unwrap()[0];
        assert_ne!(stored.password, "secret1");
        assert!(verify_password("secret1", &stored.password));
    }

    #[tokio::test]
    async fn test_update_keeps_password_when_omitted() {
        let (_dir, db) = local_database().await;
        let service = UserService::new(db.clone());
        let created = service.create(create_dto("viewer")).await.unwrap();
        let before = db.fetch_users().await.unwrap()[0].password.clone();

        let updated = service
            .update(
                &created.id,
                UpdateUserDto {
                    name: "Renamed".to_string(),
                    username: "viewer".to_string(),
                    password: None,
                    role: UserRole::Admin,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.role, UserRole::Admin);
        assert_eq!(db.fetch_users().await.unwrap()[0].password, before);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_username_and_unknown_id() {
        let (_dir, db) = local_database().await;
        let service = UserService::new(db);
        service.create(create_dto("first")).await.unwrap();
        let second = service.create(create_dto("second")).await.unwrap();

        let dto = UpdateUserDto {
            name: "Second".to_string(),
            username: "first".to_string(),
            password: None,
            role: UserRole::Bank,
        };
        assert!(matches!(
            service.update(&second.id, dto.clone()).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            service.update("user-missing", dto).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_unknown_user() {
        let (_dir, db) = local_database().await;
        let service = UserService::new(db);

        assert!(matches!(
            service.delete("user-missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
