//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod auth;
pub mod categories;
pub mod expenses;
pub mod reports;
pub mod users;

// Re-export all handlers for use in router
pub use auth::*;
pub use categories::*;
pub use expenses::*;
pub use reports::*;
pub use users::*;

use chrono::{DateTime, NaiveDate};

use crate::AppError;

/// Parse a `YYYY-MM-DD` or RFC 3339 date
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Parse an optional query date, naming the parameter on failure
pub(crate) fn parse_query_date(
    value: Option<&str>,
    param: &str,
) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => parse_date(v).map(Some).ok_or_else(|| {
            AppError::bad_request(&format!(
                "Invalid {} (use YYYY-MM-DD or RFC 3339)",
                param
            ))
        }),
    }
}
