//! Outlay Core Library
//!
//! Shared functionality for the Outlay expense tracker:
//! - Database access and migrations (users, categories, expenses)
//! - SQL aggregations for monthly and per-category summaries
//! - Password hashing and token generation
//! - Expense analytics: trends, budget recommendations, forecasts

pub mod analytics;
pub mod auth;
pub mod db;
pub mod error;
pub mod models;

pub use analytics::{AnalyticsReport, CategoryAnalytics, MonthKey, MonthlyChange};
pub use db::Database;
pub use error::{Error, Result};
