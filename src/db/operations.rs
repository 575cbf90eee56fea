use sqlx::PgPool;
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::models::{RefreshToken, User};
use crate::error::AppError;

#[derive(Clone)]
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        Ok(self.pool.as_ref().begin().await?)
    }

    pub async fn create_user_with_transaction(
        &self,
        user: &User,
        transaction: &mut Transaction<'_, Postgres>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, role, phone_number, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, username, password_hash, role, phone_number, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.phone_number)
        .bind(user.created_at)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(user)
    }

    pub async fn create_user(&self, user: &User) -> Result<User, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let result = self.create_user_with_transaction(user, &mut transaction).await;

        match result {
            Ok(user) => {
                transaction.commit().await?;
                Ok(user)
            }
            Err(e) => {
                transaction.rollback().await?;
                Err(e)
            }
        }
    }

    pub async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, phone_number, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, role, phone_number, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    pub async fn insert_refresh_token(
        &self,
        refresh_token: &RefreshToken,
    ) -> Result<RefreshToken, AppError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, token, user_id, created_at
            "#,
        )
        .bind(refresh_token.id)
        .bind(&refresh_token.token)
        .bind(refresh_token.user_id)
        .bind(refresh_token.created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    pub async fn get_refresh_token(&self, token: &str) -> Result<Option<RefreshToken>, AppError> {
        let row = sqlx::query_as::<_, RefreshToken>(
            "SELECT id, token, user_id, created_at FROM refresh_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row)
    }

    /// Deletes the refresh row if present. Returns the number of rows
    /// removed; zero means the token was unknown or already revoked.
    pub async fn delete_refresh_token(&self, token: &str) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token = $1")
            .bind(token)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }
}
