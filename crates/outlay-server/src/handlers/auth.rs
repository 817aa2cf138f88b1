//! Registration, login and session handlers

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{auth_user, read_json, AppError, AppState};
use outlay_core::models::User;

/// Request body for registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for a successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub token: String,
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(message))
}

/// POST /register - Create an account and log it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let req: RegisterRequest = read_json(request).await?;

    let name = required(&req.name, "The Name Missing")?;
    let email = required(&req.email, "Missing email")?;
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing Password"))?;

    let user_id = match state.db.create_user(name, email, password) {
        Ok(id) => id,
        Err(outlay_core::Error::Conflict(_)) => {
            return Err(AppError::bad_request("User already exists"))
        }
        Err(e) => return Err(e.into()),
    };

    let user = state
        .db
        .get_user(user_id)?
        .ok_or_else(|| AppError::internal("User not found after creation"))?;
    let token = state.sessions.issue(user.id).await;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
            token,
        }),
    ))
}

/// Request body for login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Decode `Authorization: Basic base64(email:password)`
pub(crate) fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let encoded = headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (email, password) = decoded.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

/// POST /login - Exchange credentials (JSON body or HTTP Basic) for a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<LoginResponse>, AppError> {
    let basic = basic_credentials(request.headers());
    let (email, password) = match basic {
        Some(credentials) => credentials,
        None => {
            let req: LoginRequest = read_json(request).await?;
            match (req.email, req.password) {
                (Some(email), Some(password)) => (email, password),
                _ => return Err(AppError::unauthorized("Unauthorized")),
            }
        }
    };

    let Some(user) = state.db.authenticate(&email, &password)? else {
        warn!("Failed login attempt");
        return Err(AppError::unauthorized("Unauthorized"));
    };

    let token = state.sessions.issue(user.id).await;
    let active_sessions = state.sessions.active_count().await;
    info!(
        user_id = user.id,
        active_sessions,
        "User logged in"
    );

    Ok(Json(LoginResponse { token, user }))
}

/// POST /logout - Revoke the caller's token
pub async fn logout(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = auth_user(&request)?;
    state.sessions.revoke(&caller.token).await;
    let active_sessions = state.sessions.active_count().await;
    info!(
        user_id = caller.user.id,
        active_sessions,
        "User logged out"
    );

    Ok(Json(serde_json::json!({ "message": "Logout successful" })))
}

/// GET /me - The authenticated user
pub async fn get_me(request: Request) -> Result<Json<User>, AppError> {
    Ok(Json(auth_user(&request)?.user))
}

/// GET /health - Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
