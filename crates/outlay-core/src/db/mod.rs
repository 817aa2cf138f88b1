//! Database access layer with connection pooling and migrations
//!
//! This module is organized by domain:
//! - `users` - Registration lookups and credential checks
//! - `categories` - Per-user category CRUD and template seeding
//! - `expenses` - Expense CRUD, filtering and sample data
//! - `reports` - SQL aggregations and the analytics report

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use tempfile::TempDir;
use tracing::info;

use crate::error::Result;
use crate::models::DatabaseStats;

mod categories;
mod expenses;
mod reports;
mod users;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConn = PooledConnection<SqliteConnectionManager>;

/// Storage format for expense dates
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a SQLite datetime string into a DateTime<Utc>
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    // SQLite stores as "YYYY-MM-DD HH:MM:SS" format
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.and_utc())
        .unwrap_or_else(|_| Utc::now())
}

/// Read a `YYYY-MM-DD` column
pub(crate) fn date_column(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Whether an error is a UNIQUE constraint violation
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Whether an error is a FOREIGN KEY constraint violation
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

/// Database wrapper with connection pooling
#[derive(Clone)]
pub struct Database {
    pool: DbPool,
    /// Path to the database file
    db_path: String,
    /// Backing directory of an [`in_memory`](Self::in_memory) database,
    /// removed with the database, WAL and shm files when the last clone drops
    scratch_dir: Option<Arc<TempDir>>,
}

impl Database {
    /// Open (or create) the database at `path` and run migrations
    pub fn new(path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });
        let pool = Pool::builder().max_size(10).build(manager)?;

        let db = Self {
            pool,
            db_path: path.to_string(),
            scratch_dir: None,
        };
        db.run_migrations()?;

        Ok(db)
    }

    /// Get the path to the database file
    pub fn path(&self) -> &str {
        &self.db_path
    }

    /// Create a throwaway database (for testing)
    ///
    /// Backed by a file in a fresh temporary directory rather than `:memory:`,
    /// because every pooled connection would otherwise see its own empty
    /// database. The directory is deleted once the database is dropped.
    pub fn in_memory() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("outlay_test_").tempdir()?;
        let path = dir.path().join("outlay.db");

        let mut db = Self::new(&path.to_string_lossy())?;
        db.scratch_dir = Some(Arc::new(dir));
        Ok(db)
    }

    /// Get a connection from the pool
    pub fn conn(&self) -> Result<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Row counts per table
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;
        let count = |table: &str| -> Result<i64> {
            Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
                row.get(0)
            })?)
        };

        Ok(DatabaseStats {
            users: count("users")?,
            categories: count("categories")?,
            expenses: count("expenses")?,
        })
    }

    /// Run database migrations
    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Enable foreign keys
            PRAGMA foreign_keys = ON;

            -- WAL mode: readers don't block writers
            PRAGMA journal_mode = WAL;

            PRAGMA synchronous = NORMAL;

            -- Users
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            );

            -- Categories (owned by a user, unique name per user)
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                UNIQUE(user_id, name)
            );

            CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);

            -- Expenses (a category in use cannot be deleted)
            CREATE TABLE IF NOT EXISTS expenses (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                category_id INTEGER NOT NULL REFERENCES categories(id),
                amount REAL NOT NULL CHECK (amount > 0),
                description TEXT NOT NULL,
                date DATE NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME
            );

            CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date);
            CREATE INDEX IF NOT EXISTS idx_expenses_category ON expenses(category_id);
            "#,
        )?;

        info!(path = %self.db_path, "Database migrations complete");
        Ok(())
    }
}
