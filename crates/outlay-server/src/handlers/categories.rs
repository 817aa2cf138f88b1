//! Category management handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{auth_user, read_json, AppError, AppState};
use outlay_core::models::Category;

/// Response for GET /categories
#[derive(Serialize)]
pub struct CategoriesResponse {
    pub categories: Vec<Category>,
}

/// A category with a status message
#[derive(Serialize)]
pub struct CategoryResponse {
    pub message: String,
    pub category: Category,
}

/// GET /categories - The caller's categories, by name
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<CategoriesResponse>, AppError> {
    let caller = auth_user(&request)?;
    let categories = state.db.list_categories(caller.user.id)?;
    Ok(Json(CategoriesResponse { categories }))
}

/// Request body for creating a category
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// POST /categories - Create a category
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<CategoryResponse>), AppError> {
    let caller = auth_user(&request)?;
    let req: CreateCategoryRequest = read_json(request).await?;

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing name"))?;
    let description = req
        .description
        .as_deref()
        .ok_or_else(|| AppError::bad_request("Missing description"))?;

    let id = match state.db.create_category(caller.user.id, name, description) {
        Ok(id) => id,
        Err(outlay_core::Error::Conflict(_)) => {
            return Err(AppError::bad_request("Category already exists"))
        }
        Err(e) => return Err(e.into()),
    };

    let category = state
        .db
        .get_category(caller.user.id, id)?
        .ok_or_else(|| AppError::internal("Category not found after creation"))?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: "Category created successfully".to_string(),
            category,
        }),
    ))
}

/// Request body for updating a category
#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// PUT /categories/:id - Rename or re-describe a category
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<CategoryResponse>, AppError> {
    let caller = auth_user(&request)?;
    let req: UpdateCategoryRequest = read_json(request).await?;

    match state.db.update_category(
        caller.user.id,
        id,
        req.name.as_deref(),
        req.description.as_deref(),
    ) {
        Ok(()) => {}
        Err(outlay_core::Error::Conflict(_)) => {
            return Err(AppError::bad_request("Category already exists"))
        }
        Err(e) => return Err(e.into()),
    }

    let category = state
        .db
        .get_category(caller.user.id, id)?
        .ok_or_else(|| AppError::not_found("Category not found"))?;

    Ok(Json(CategoryResponse {
        message: "Category updated successfully".to_string(),
        category,
    }))
}

/// DELETE /categories/:id - Delete an unused category
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = auth_user(&request)?;
    state.db.delete_category(caller.user.id, id)?;

    Ok(Json(
        serde_json::json!({ "message": "Category deleted successfully" }),
    ))
}

/// POST /categories/seed - Create the template categories for a new user
pub async fn seed_categories(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let caller = auth_user(&request)?;

    if !state.db.list_categories(caller.user.id)?.is_empty() {
        return Err(AppError::bad_request("Categories already exist"));
    }

    let created = state.db.seed_categories(caller.user.id)?;
    info!(user_id = caller.user.id, created, "Seeded categories via API");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Categories seeded successfully",
            "created": created,
        })),
    ))
}
