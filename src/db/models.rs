use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Seller,
    Buyer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: String,
        password_hash: String,
        role: UserRole,
        phone_number: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            password_hash,
            role,
            phone_number,
            created_at: Utc::now(),
        }
    }
}

/// One row per currently-valid refresh token. A row existing is the sole
/// validity signal: logout deletes it, refresh leaves it in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn new(token: String, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            token,
            user_id,
            created_at: Utc::now(),
        }
    }
}
