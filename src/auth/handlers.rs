use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::db::models::UserRole;
use crate::error::{AppError, AuthError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: String,
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received registration request for username: {}", req.username);

    match state
        .auth_service
        .register(&req.username, &req.password, req.role, req.phone_number.clone())
        .await
    {
        Ok(_) => {
            info!("Registration successful for username: {}", req.username);
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "message": "Saved"
            })))
        }
        Err(e) => {
            error!("Registration failed for username: {}: {}", req.username, e);
            Err(e)
        }
    }
}

/// Login is the only throttled operation; register and refresh are left
/// unthrottled, matching observed behavior.
pub async fn login(
    req: HttpRequest,
    form: web::Form<LoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let client_key = client_key(&req);

    if !state.rate_limiter.allow(&client_key).await {
        warn!("Rate limited login attempt from {}", client_key);
        return Err(AuthError::RateLimited.into());
    }

    info!("Received login request for username: {}", form.username);
    match state.auth_service.login(&form.username, &form.password).await {
        Ok(tokens) => {
            info!("Login successful for username: {}", form.username);
            Ok(HttpResponse::Ok().json(LoginResponse {
                access_token: tokens.access_token,
                refresh_token: tokens.refresh_token,
                token_type: "bearer".to_string(),
            }))
        }
        Err(e) => {
            error!("Login failed for username: {}: {}", form.username, e);
            Err(e)
        }
    }
}

pub async fn logout(
    req: web::Json<RefreshTokenRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    state.auth_service.logout(&req.refresh_token).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Logged out"
    })))
}

pub async fn refresh(
    req: web::Json<RefreshTokenRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let access_token = state.auth_service.refresh(&req.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

fn client_key(req: &HttpRequest) -> String {
    req.peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
