//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `resolve_user` - Look up the user a command acts for
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use outlay_core::db::Database;
use outlay_core::models::User;
use tracing::debug;

/// Open (and migrate) the database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    debug!(path = path_str, "Opening database");
    Database::new(path_str).context("Failed to open database")
}

/// Find a user by email
pub fn resolve_user(db: &Database, email: &str) -> Result<User> {
    db.get_user_by_email(email)?
        .with_context(|| format!("No user registered with email '{}'", email))
}

/// Parse an optional `YYYY-MM-DD` argument
pub fn parse_date_arg(value: Option<&str>, flag: &str) -> Result<Option<NaiveDate>> {
    value
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .with_context(|| format!("Invalid {} date format (use YYYY-MM-DD)", flag))
        })
        .transpose()
}

pub fn cmd_init(db_path: &Path) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;
    let stats = db.stats().context("Failed to read database")?;

    println!("✅ Database initialized successfully!");
    println!("   Users: {}", stats.users);
    println!();
    println!("Next steps:");
    println!("  1. Start the API: outlay serve");
    println!("  2. Register from your frontend, or POST /register");

    Ok(())
}
