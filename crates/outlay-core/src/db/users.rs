//! User operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{is_unique_violation, parse_datetime, Database};
use crate::auth::{hash_password, verify_password};
use crate::error::{Error, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at";

fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let created_at_str: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: parse_datetime(&created_at_str),
    })
}

/// Emails are compared trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Database {
    /// Register a user, hashing the password; fails with `Conflict` if the
    /// email is taken
    pub fn create_user(&self, name: &str, email: &str, password: &str) -> Result<i64> {
        let email = normalize_email(email);
        if self.get_user_by_email(&email)?.is_some() {
            return Err(Error::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(password)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO users (name, email, password_hash) VALUES (?, ?, ?)",
            params![name.trim(), email, password_hash],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict("User already exists".to_string())
            } else {
                Error::Database(e)
            }
        })?;

        let id = conn.last_insert_rowid();
        info!(user_id = id, "Registered user");
        Ok(id)
    }

    /// Get a user by ID
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                params![id],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get a user by email (case-insensitive)
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                params![normalize_email(email)],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// List all users, oldest first
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id",
            USER_COLUMNS
        ))?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Check credentials, returning the user when they match
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_email(email)? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }
}
