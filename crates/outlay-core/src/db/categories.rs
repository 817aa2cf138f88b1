//! Category operations

use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{is_foreign_key_violation, is_unique_violation, parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{Category, TEMPLATE_CATEGORIES};

const CATEGORY_COLUMNS: &str = "id, user_id, name, description, created_at";

fn map_category(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    let created_at_str: String = row.get(4)?;
    Ok(Category {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(&created_at_str),
    })
}

fn duplicate_name(e: rusqlite::Error) -> Error {
    if is_unique_violation(&e) {
        Error::Conflict("Category already exists".to_string())
    } else {
        Error::Database(e)
    }
}

impl Database {
    /// List a user's categories by name
    pub fn list_categories(&self, user_id: i64) -> Result<Vec<Category>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM categories WHERE user_id = ? ORDER BY name",
            CATEGORY_COLUMNS
        ))?;
        let categories = stmt
            .query_map(params![user_id], map_category)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Get one of a user's categories
    pub fn get_category(&self, user_id: i64, id: i64) -> Result<Option<Category>> {
        let conn = self.conn()?;
        let category = conn
            .query_row(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                params![id, user_id],
                map_category,
            )
            .optional()?;
        Ok(category)
    }

    /// Create a category; the name must be unique for the user
    pub fn create_category(&self, user_id: i64, name: &str, description: &str) -> Result<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidData("Missing name".to_string()));
        }

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO categories (user_id, name, description) VALUES (?, ?, ?)",
            params![user_id, name, description.trim()],
        )
        .map_err(duplicate_name)?;

        Ok(conn.last_insert_rowid())
    }

    /// Rename and/or re-describe a category
    pub fn update_category(
        &self,
        user_id: i64,
        id: i64,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<()> {
        let existing = self
            .get_category(user_id, id)?
            .ok_or_else(|| Error::NotFound("Category not found".to_string()))?;

        let name = name.map(str::trim).unwrap_or(existing.name.as_str());
        if name.is_empty() {
            return Err(Error::InvalidData("Missing name".to_string()));
        }
        let description = description.map(str::trim).unwrap_or(existing.description.as_str());

        let conn = self.conn()?;
        conn.execute(
            "UPDATE categories SET name = ?, description = ? WHERE id = ? AND user_id = ?",
            params![name, description, id, user_id],
        )
        .map_err(duplicate_name)?;

        Ok(())
    }

    /// Delete a category
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` while expenses
    /// still reference it.
    pub fn delete_category(&self, user_id: i64, id: i64) -> Result<()> {
        let conn = self.conn()?;

        let in_use: i64 = conn.query_row(
            "SELECT COUNT(*) FROM expenses WHERE category_id = ? AND user_id = ?",
            params![id, user_id],
            |row| row.get(0),
        )?;
        if in_use > 0 {
            return Err(Error::Conflict(format!(
                "Category is used by {} expense(s)",
                in_use
            )));
        }

        // An expense inserted after the count still trips the foreign key
        let deleted = conn
            .execute(
                "DELETE FROM categories WHERE id = ? AND user_id = ?",
                params![id, user_id],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    Error::Conflict("Category is used by other expenses".to_string())
                } else {
                    Error::Database(e)
                }
            })?;
        if deleted == 0 {
            return Err(Error::NotFound("Category not found".to_string()));
        }

        Ok(())
    }

    /// Create the template categories for a user (idempotent - skips existing names)
    ///
    /// Returns the number of categories created.
    pub fn seed_categories(&self, user_id: i64) -> Result<usize> {
        let conn = self.conn()?;
        let mut created = 0;

        for (name, description) in &TEMPLATE_CATEGORIES {
            created += conn.execute(
                "INSERT OR IGNORE INTO categories (user_id, name, description) VALUES (?, ?, ?)",
                params![user_id, name, description],
            )?;
        }

        info!(user_id, created, "Seeded template categories");
        Ok(created)
    }
}
