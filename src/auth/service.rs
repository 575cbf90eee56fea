use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::auth::tokens::{Claims, TokenIssuer};
use crate::config::AuthConfig;
use crate::db::models::{RefreshToken, User, UserRole};
use crate::db::DbOperations;
use crate::error::{AppError, AuthError, DatabaseError};

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db: DbOperations,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(db: DbOperations, config: &AuthConfig) -> Result<Self, AppError> {
        Ok(Self {
            db,
            tokens: TokenIssuer::new(config)?,
        })
    }

    /// Creates a user with an Argon2id-hashed password. The plaintext is
    /// dropped as soon as the hash exists.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: UserRole,
        phone_number: Option<String>,
    ) -> Result<User, AppError> {
        if password.is_empty() {
            return Err(AppError::ValidationError("password must not be empty".into()));
        }

        if self.db.get_user_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUsername.into());
        }

        let password_hash = Self::hash_password(password)?;
        let user = User::new(username.to_string(), password_hash, role, phone_number);

        match self.db.create_user(&user).await {
            Ok(user) => Ok(user),
            // Two concurrent registrations can pass the pre-check; the
            // unique index decides the race.
            Err(AppError::DatabaseError(DatabaseError::Duplicate)) => {
                Err(AuthError::DuplicateUsername.into())
            }
            Err(e) => Err(e),
        }
    }

    /// Verifies credentials and issues an access/refresh token pair,
    /// persisting the refresh token. Nothing is persisted on failure.
    /// A missing user and a wrong password are indistinguishable to the
    /// caller.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AppError> {
        let user = self
            .db
            .get_user_by_username(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Self::verify_password(password, &user.password_hash)?;

        let (access_token, _) = self.tokens.issue_access_token(&user.username)?;

        // The random jti makes a token-string collision with an existing
        // row negligible; the unique index still enforces it, so
        // regenerate once if it ever trips.
        for _ in 0..2 {
            let (refresh_token, _) = self.tokens.issue_refresh_token(&user.username)?;
            let row = RefreshToken::new(refresh_token.clone(), user.id);

            match self.db.insert_refresh_token(&row).await {
                Ok(_) => {
                    return Ok(TokenPair {
                        access_token,
                        refresh_token,
                    })
                }
                Err(AppError::DatabaseError(DatabaseError::Duplicate)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(AppError::InternalError(
            "could not issue a unique refresh token".into(),
        ))
    }

    /// Revokes a refresh token. A second logout with the same token fails
    /// with `TokenNotFound`, so the operation is idempotent-safe.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AppError> {
        let deleted = self.db.delete_refresh_token(refresh_token).await?;
        if deleted == 0 {
            return Err(AuthError::TokenNotFound.into());
        }
        Ok(())
    }

    /// Exchanges a registered refresh token for a new access token. The
    /// refresh row is the sole validity signal: it is neither rotated nor
    /// checked against its embedded expiry claim, so the token stays
    /// usable until explicit logout.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AppError> {
        let row = self
            .db
            .get_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let user = self
            .db
            .get_user_by_id(row.user_id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        let (access_token, _) = self.tokens.issue_access_token(&user.username)?;
        Ok(access_token)
    }

    /// Bearer-token check for downstream collaborators. Pure signature
    /// and expiry verification; no stored state is consulted.
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        self.tokens.validate(token)
    }

    pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::InternalError(format!("password hashing failed: {}", e)))?;

        Ok(hash.to_string())
    }

    pub(crate) fn verify_password(password: &str, password_hash: &str) -> Result<(), AppError> {
        let parsed = PasswordHash::new(password_hash)
            .map_err(|e| AppError::InternalError(format!("stored password hash is invalid: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = AuthService::hash_password("pw1").unwrap();
        assert_ne!(hash, "pw1");
        assert!(AuthService::verify_password("pw1", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = AuthService::hash_password("pw1").unwrap();
        assert!(matches!(
            AuthService::verify_password("pw2", &hash),
            Err(AppError::AuthError(AuthError::InvalidCredentials))
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = AuthService::hash_password("pw1").unwrap();
        let second = AuthService::hash_password("pw1").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_corrupt_hash_is_internal_error() {
        assert!(matches!(
            AuthService::verify_password("pw1", "not-a-phc-string"),
            Err(AppError::InternalError(_))
        ));
    }
}
