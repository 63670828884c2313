use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::users::models::{User, UserRole};
use crate::shared::validation::USERNAME_REGEX;

/// User as exposed over the API; the password never leaves the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: UserRole,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            role: user.role,
        }
    }
}

/// Request DTO for creating a user (admin) or registering
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters"),
        regex(path = *USERNAME_REGEX, message = "Username may only contain letters, digits, dots and underscores")
    )]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    pub role: UserRole,
}

/// Request DTO for updating a user; an omitted password keeps the current one
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(
        length(min = 3, max = 50, message = "Username must be 3-50 characters"),
        regex(path = *USERNAME_REGEX, message = "Username may only contain letters, digits, dots and underscores")
    )]
    pub username: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: Option<String>,

    pub role: UserRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateUserDto {
        CreateUserDto {
            name: "Branch Viewer".to_string(),
            username: "bank.cairo".to_string(),
            password: "secret1".to_string(),
            role: UserRole::Bank,
        }
    }

    #[test]
    fn test_create_dto_validation() {
        assert!(create_dto().validate().is_ok());

        let mut dto = create_dto();
        dto.username = "9lives".to_string();
        assert!(dto.validate().is_err());

        let mut dto = create_dto();
        dto.password = "123".to_string();
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_update_dto_password_optional() {
        let dto: UpdateUserDto = serde_json::from_str(
            r#"{"name": "Ops", "username": "ops", "role": "admin"}"#,
        )
        .unwrap();
        assert!(dto.password.is_none());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_user_dto_drops_password() {
        let user = User {
            id: "user-1".to_string(),
            username: "admin".to_string(),
            password: "hmac-sha256$abc$def".to_string(),
            role: UserRole::Admin,
            name: "Admin".to_string(),
        };
        let json = serde_json::to_value(UserDto::from(user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }
}
