//! User listing handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::{AppError, AppState};
use outlay_core::models::User;

/// Response for GET /users
#[derive(Serialize)]
pub struct UsersResponse {
    pub users: Vec<User>,
}

/// GET /users - All registered users (password hashes are never serialized)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, AppError> {
    let users = state.db.list_users()?;
    Ok(Json(UsersResponse { users }))
}
