use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // Username
    pub exp: i64,     // Expiration time
    pub iat: i64,     // Issued at
    pub jti: String,  // Random id, makes every issued token string unique
}

/// Signs and validates access and refresh tokens with a shared symmetric
/// secret. Validation is pure computation; any server instance configured
/// with the same secret accepts the same tokens.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let algorithm = config
            .algorithm
            .parse::<Algorithm>()
            .map_err(|e| AppError::ConfigError(format!("unsupported signing algorithm {}: {}", config.algorithm, e)))?;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            algorithm,
            access_lifetime: Duration::minutes(config.access_token_minutes),
            refresh_lifetime: Duration::days(config.refresh_token_days),
        })
    }

    pub fn issue_access_token(&self, subject: &str) -> Result<(String, i64), AppError> {
        self.issue(subject, self.access_lifetime)
    }

    pub fn issue_refresh_token(&self, subject: &str) -> Result<(String, i64), AppError> {
        self.issue(subject, self.refresh_lifetime)
    }

    fn issue(&self, subject: &str, lifetime: Duration) -> Result<(String, i64), AppError> {
        let now = Utc::now();
        let exp = (now + lifetime).timestamp();
        let claims = Claims {
            sub: subject.to_string(),
            exp,
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AppError::InternalError(format!("token signing failed: {}", e)))?;

        Ok((token, exp))
    }

    /// Checks signature and expiry. Fails with `InvalidToken` on either;
    /// the caller cannot tell a forged token from an expired one.
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test_secret".to_string(),
            algorithm: "HS256".to_string(),
            access_token_minutes: 30,
            refresh_token_days: 7,
        }
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let (token, exp) = issuer.issue_access_token("alice").unwrap();

        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, exp);
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let (_, access_exp) = issuer.issue_access_token("alice").unwrap();
        let (_, refresh_exp) = issuer.issue_refresh_token("alice").unwrap();
        assert!(refresh_exp > access_exp);
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let (first, _) = issuer.issue_access_token("alice").unwrap();
        let (second, _) = issuer.issue_access_token("alice").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut config = test_config();
        config.access_token_minutes = -5;
        let issuer = TokenIssuer::new(&config).unwrap();

        let (token, _) = issuer.issue_access_token("alice").unwrap();
        assert!(matches!(
            issuer.validate(&token),
            Err(AppError::AuthError(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        let (token, _) = issuer.issue_access_token("alice").unwrap();

        let mut other_config = test_config();
        other_config.jwt_secret = "other_secret".to_string();
        let other = TokenIssuer::new(&other_config).unwrap();

        assert!(matches!(
            other.validate(&token),
            Err(AppError::AuthError(AuthError::InvalidToken))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let issuer = TokenIssuer::new(&test_config()).unwrap();
        assert!(issuer.validate("not-a-token").is_err());
    }

    #[test]
    fn test_unsupported_algorithm() {
        let mut config = test_config();
        config.algorithm = "XX999".to_string();
        assert!(matches!(
            TokenIssuer::new(&config),
            Err(AppError::ConfigError(_))
        ));
    }
}
