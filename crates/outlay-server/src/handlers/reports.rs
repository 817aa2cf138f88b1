//! Report handlers

use std::sync::Arc;

use axum::{
    extract::{Query, Request, State},
    Json,
};
use chrono::{Datelike, Utc};
use serde::Deserialize;

use super::{parse_query_date, ExpenseQuery};
use crate::{auth_user, AppError, AppState};
use outlay_core::models::{ExpenseSummary, MonthlyExpensesReport};
use outlay_core::AnalyticsReport;

/// Query parameters for the monthly report
#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    /// Calendar year (defaults to the current year)
    pub year: Option<i32>,
}

/// GET /expenses/monthly - Monthly totals for a year
pub async fn get_monthly_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlyQuery>,
    request: Request,
) -> Result<Json<MonthlyExpensesReport>, AppError> {
    let caller = auth_user(&request)?;
    let year = params.year.unwrap_or_else(|| Utc::now().year());

    let report = state.db.get_monthly_expenses(caller.user.id, year)?;
    Ok(Json(report))
}

/// Query parameters for the category summary
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /expenses/summary - Totals per category with their share
pub async fn get_expense_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummaryQuery>,
    request: Request,
) -> Result<Json<ExpenseSummary>, AppError> {
    let caller = auth_user(&request)?;
    let from = parse_query_date(params.start_date.as_deref(), "startDate")?;
    let to = parse_query_date(params.end_date.as_deref(), "endDate")?;

    let summary = state.db.get_expense_summary(caller.user.id, from, to)?;
    Ok(Json(summary))
}

/// GET /expenses/analytics - Trends, budget recommendations and forecast
pub async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ExpenseQuery>,
    request: Request,
) -> Result<Json<AnalyticsReport>, AppError> {
    let caller = auth_user(&request)?;
    let filter = params.to_filter()?;

    let report = state.db.get_analytics(caller.user.id, &filter)?;
    Ok(Json(report))
}
