use super::model::{AuthenticatedUser, TokenClaims};
use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};

pub struct JwtValidator {
    decoding_key: DecodingKey,
    issuer: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            leeway: config.jwt_leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        // Validate algorithm from header
        if header.alg != Algorithm::HS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only HS256 is allowed",
                header.alg
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = self.leeway;

        let token_data = decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        Ok(token_data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::services::TokenService;
    use crate::features::users::models::{User, UserRole};
    use std::time::Duration;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            issuer: "atm-maintenance".to_string(),
            token_ttl: Duration::from_secs(3600),
            jwt_leeway: Duration::from_secs(0),
        }
    }

    fn user() -> User {
        User {
            id: "user-2".to_string(),
            username: "bank".to_string(),
            password: String::new(),
            role: UserRole::Bank,
            name: "Bank Viewer".to_string(),
        }
    }

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_issued_token_validates() {
        let token = TokenService::new(&config(SECRET)).issue(&user()).unwrap();
        let caller = JwtValidator::new(&config(SECRET))
            .validate_token(&token.access_token)
            .unwrap();

        assert_eq!(caller.user_id, "user-2");
        assert_eq!(caller.username, "bank");
        assert_eq!(caller.role, UserRole::Bank);
        assert!(!caller.is_admin());
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn test_rejects_foreign_signature_and_issuer() {
        let token = TokenService::new(&config(SECRET)).issue(&user()).unwrap();

        let other_secret = JwtValidator::new(&config("fedcba9876543210fedcba9876543210"));
        assert!(other_secret.validate_token(&token.access_token).is_err());

        let mut other_issuer = config(SECRET);
        other_issuer.issuer = "someone-else".to_string();
        assert!(JwtValidator::new(&other_issuer)
            .validate_token(&token.access_token)
            .is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        let validator = JwtValidator::new(&config(SECRET));
        assert!(matches!(
            validator.validate_token("not-a-token"),
            Err(AppError::Auth(_))
        ));
    }
}
