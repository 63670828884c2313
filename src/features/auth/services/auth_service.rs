use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{AuthResponseDto, LoginRequestDto, MeResponseDto};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::password::{hash_password, is_legacy, verify_password};
use crate::features::auth::services::TokenService;
use crate::features::users::dtos::{CreateUserDto, UserDto};
use crate::features::users::models::User;
use crate::features::users::UserService;
use crate::modules::datastore::DatabaseService;

/// Service for authentication operations (register, login)
pub struct AuthService {
    db: Arc<DatabaseService>,
    user_service: Arc<UserService>,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        db: Arc<DatabaseService>,
        user_service: Arc<UserService>,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            db,
            user_service,
            token_service,
        }
    }

    /// Register a new account. The caller logs in afterwards.
    pub async fn register(&self, dto: CreateUserDto) -> Result<UserDto> {
        self.user_service.create(dto).await
    }

    /// Login with username and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let user = self
            .user_service
            .find_by_username(&dto.username)
            .await?
            .filter(|u| verify_password(&dto.password, &u.password))
            .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

        if is_legacy(&user.password) {
            self.upgrade_password(&user, &dto.password).await;
        }

        let token = self.token_service.issue(&user)?;
        tracing::info!("User {} logged in", user.username);

        Ok(AuthResponseDto {
            access_token: token.access_token,
            token_type: "Bearer".to_string(),
            expires_in: token.expires_in,
            user: user.into(),
        })
    }

    /// Get current user info (for /me endpoint)
    pub fn get_current_user(&self, user: AuthenticatedUser) -> MeResponseDto {
        user.into()
    }

    /// Replace a plain-text password with its digest. Failure only delays the upgrade.
    async fn upgrade_password(&self, user: &User, password: &str) {
        let upgraded = User {
            password: hash_password(password),
            ..user.clone()
        };
        match self.db.update_user(&upgraded).await {
            Ok(_) => tracing::info!("Upgraded stored password of user {}", user.id),
            Err(e) => tracing::warn!(
                "Failed to upgrade stored password of user {}: {}",
                user.id,
                e
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::users::models::{NewUser, UserRole};
    use crate::shared::test_helpers::local_database;
    use std::time::Duration;

    fn service(db: Arc<DatabaseService>) -> AuthService {
        let config = AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            issuer: "atm-maintenance".to_string(),
            token_ttl: Duration::from_secs(60),
            jwt_leeway: Duration::from_secs(0),
        };
        AuthService::new(
            db.clone(),
            Arc::new(UserService::new(db)),
            Arc::new(TokenService::new(&config)),
        )
    }

    fn login(username: &str, password: &str) -> LoginRequestDto {
        LoginRequestDto {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (_dir, db) = local_database().await;
        let auth = service(db);

        let created = auth
            .register(CreateUserDto {
                name: "Alex Branch".to_string(),
                username: "alex".to_string(),
                password: "secret1".to_string(),
                role: UserRole::Bank,
            })
            .await
            .unwrap();

        let response = auth.login(login("alex", "secret1")).await.unwrap();
        assert_eq!(response.user, created);
        assert_eq!(response.token_type, "Bearer");
        assert!(!response.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_unauthorized() {
        let (_dir, db) = local_database().await;
        let auth = service(db);
        auth.register(CreateUserDto {
            name: "Alex".to_string(),
            username: "alex".to_string(),
            password: "secret1".to_string(),
            role: UserRole::Bank,
        })
        .await
        .unwrap();

        assert!(matches!(
            auth.login(login("alex", "wrong")).await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            auth.login(login("nobody", "secret1")).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_legacy_password_is_upgraded_on_login() {
        let (_dir, db) = local_database().await;
        db.add_user(NewUser {
            username: "legacy".to_string(),
            password: "password".to_string(),
            role: UserRole::Admin,
            name: "Legacy Admin".to_string(),
        })
        .await
        .unwrap();
        let auth = service(db.clone());

        auth.login(login("legacy", "password")).await.unwrap();

        let stored = db.fetch_users().await.unwrap().remove(0);
        assert!(!is_legacy(&stored.password));
        assert!(verify_password("password", &stored.password));
        // Still able to log in with the same password
        auth.login(login("legacy", "password")).await.unwrap();
    }
}
