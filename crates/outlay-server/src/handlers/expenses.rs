//! Expense handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_date, parse_query_date};
use crate::{auth_user, read_json, AppError, AppState};
use outlay_core::models::{Expense, ExpenseFilter, NewExpense};

/// Query parameters shared by expense listing and analytics
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category_id: Option<i64>,
}

impl ExpenseQuery {
    pub(crate) fn to_filter(&self) -> Result<ExpenseFilter, AppError> {
        Ok(ExpenseFilter {
            from: parse_query_date(self.start_date.as_deref(), "startDate")?,
            to: parse_query_date(self.end_date.as_deref(), "endDate")?,
            category_id: self.category_id,
            limit: None,
        })
    }
}

/// Response for GET /expenses
#[derive(Serialize)]
pub struct ExpensesResponse {
    pub expenses: Vec<Expense>,
}

/// An expense with a status message
#[derive(Serialize)]
pub struct ExpenseResponse {
    pub message: String,
    pub expense: Expense,
}

/// GET /expenses - The caller's expenses, newest first
pub async fn list_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
    request: Request,
) -> Result<Json<ExpensesResponse>, AppError> {
    let caller = auth_user(&request)?;
    let filter = params.to_filter()?;
    let expenses = state.db.list_expenses(caller.user.id, &filter)?;
    Ok(Json(ExpensesResponse { expenses }))
}

/// An amount sent either as a JSON number or a numeric string
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    fn value(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Request body for creating or replacing an expense
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub amount: Option<AmountInput>,
    pub description: Option<String>,
    pub date: Option<String>,
    #[serde(alias = "category_id")]
    pub category_id: Option<i64>,
}

impl ExpenseRequest {
    /// Validate the body, reporting the first missing or malformed field
    pub(crate) fn into_new_expense(self) -> Result<NewExpense, AppError> {
        let amount = self
            .amount
            .ok_or_else(|| AppError::bad_request("Missing amount"))?
            .value()
            .filter(|a| a.is_finite() && *a > 0.0)
            .ok_or_else(|| AppError::bad_request("Amount must be a positive number"))?;

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| AppError::bad_request("Missing description"))?;

        let date = self
            .date
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| AppError::bad_request("Missing date"))?;
        let date = parse_date(&date).ok_or_else(|| AppError::bad_request("Invalid date"))?;

        let category_id = self
            .category_id
            .ok_or_else(|| AppError::bad_request("Missing category ID"))?;

        Ok(NewExpense {
            category_id,
            amount,
            description,
            date,
        })
    }
}

/// POST /expenses - Record an expense
pub async fn create_expense(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<ExpenseResponse>), AppError> {
    let caller = auth_user(&request)?;
    let req: ExpenseRequest = read_json(request).await?;
    let new_expense = req.into_new_expense()?;

    let id = state.db.create_expense(caller.user.id, &new_expense)?;
    let expense = state
        .db
        .get_expense(caller.user.id, id)?
        .ok_or_else(|| AppError::internal("Expense not found after creation"))?;

    Ok((
        StatusCode::CREATED,
        Json(ExpenseResponse {
            message: "Expense created successfully".to_string(),
            expense,
        }),
    ))
}

/// PUT /expenses/:id - Replace an expense
pub async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<ExpenseResponse>, AppError> {
    let caller = auth_user(&request)?;

    if state.db.get_expense(caller.user.id, id)?.is_none() {
        return Err(AppError::not_found("Expense not found"));
    }

    let req: ExpenseRequest = read_json(request).await?;
    let new_expense = req.into_new_expense()?;
    state.db.update_expense(caller.user.id, id, &new_expense)?;

    let expense = state
        .db
        .get_expense(caller.user.id, id)?
        .ok_or_else(|| AppError::not_found("Expense not found"))?;

    Ok(Json(ExpenseResponse {
        message: "Expense updated successfully".to_string(),
        expense,
    }))
}

/// DELETE /expenses/:id - Delete an expense
pub async fn delete_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request: Request,
) -> Result<Json<serde_json::Value>, AppError> {
    let caller = auth_user(&request)?;

    if !state.db.delete_expense(caller.user.id, id)? {
        return Err(AppError::not_found("Expense not found"));
    }

    Ok(Json(
        serde_json::json!({ "message": "Expense deleted successfully" }),
    ))
}

/// POST /expenses/seed - Sample expenses over the last three months
pub async fn seed_expenses(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let caller = auth_user(&request)?;

    let created = state
        .db
        .seed_expenses(caller.user.id, Utc::now().date_naive())?;
    info!(user_id = caller.user.id, created, "Seeded expenses via API");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "message": "Expenses seeded successfully",
            "created": created,
        })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: serde_json::Value) -> ExpenseRequest {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_amount_accepts_number_or_string() {
        let from_number = body(serde_json::json!({
            "amount": 12.5, "description": "Lunch", "date": "2024-01-02", "categoryId": 1
        }))
        .into_new_expense()
        .unwrap();
        assert_eq!(from_number.amount, 12.5);

        let from_string = body(serde_json::json!({
            "amount": " 7.25 ", "description": "Bus", "date": "2024-01-02", "category_id": 1
        }))
        .into_new_expense()
        .unwrap();
        assert_eq!(from_string.amount, 7.25);
        assert_eq!(from_string.category_id, 1);
    }

    #[test]
    fn test_missing_fields_are_reported_in_order() {
        let missing_amount = body(serde_json::json!({ "description": "x" }))
            .into_new_expense()
            .unwrap_err();
        assert_eq!(missing_amount.status(), StatusCode::BAD_REQUEST);

        let bad_amount = body(serde_json::json!({
            "amount": "abc", "description": "x", "date": "2024-01-02", "categoryId": 1
        }))
        .into_new_expense();
        assert!(bad_amount.is_err());

        let negative = body(serde_json::json!({
            "amount": -4, "description": "x", "date": "2024-01-02", "categoryId": 1
        }))
        .into_new_expense();
        assert!(negative.is_err());

        let no_category = body(serde_json::json!({
            "amount": 4, "description": "x", "date": "2024-01-02"
        }))
        .into_new_expense();
        assert!(no_category.is_err());
    }
}
