pub mod auth;
pub mod config;
pub mod db;
pub mod error;

use std::sync::Arc;

use actix_web::HttpResponse;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub use crate::config::Settings;
pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;

pub use auth::{AuthService, RateLimitConfig, RateLimiter};
pub use db::{DbOperations, RefreshToken, User, UserRole};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub auth_service: Arc<AuthService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .connect(&config.database.url)
            .await
            .map_err(|e| {
                AppError::DatabaseError(error::DatabaseError::ConnectionError(e.to_string()))
            })?;
        let db_pool = Arc::new(db_pool);

        let auth_service = AuthService::new(DbOperations::new(db_pool.clone()), &config.auth)?;

        let rate_limiter = RateLimiter::new(RateLimitConfig {
            window_size: Duration::seconds(config.rate_limit.window_seconds),
            max_attempts: config.rate_limit.max_attempts,
        });

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            auth_service: Arc::new(auth_service),
            rate_limiter: Arc::new(rate_limiter),
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.db_pool.close().await;
        Ok(())
    }
}
