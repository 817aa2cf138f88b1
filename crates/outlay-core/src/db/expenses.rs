//! Expense operations

use chrono::{Datelike, Months, NaiveDate};
use rusqlite::{params, OptionalExtension};
use tracing::info;

use super::{date_column, parse_datetime, Database, DATE_FORMAT};
use crate::error::{Error, Result};
use crate::models::{Category, Expense, ExpenseFilter, NewExpense};

const EXPENSE_COLUMNS: &str =
    "id, user_id, category_id, amount, description, date, created_at, updated_at";

fn map_expense(row: &rusqlite::Row<'_>) -> rusqlite::Result<Expense> {
    let created_at_str: String = row.get(6)?;
    let updated_at_str: Option<String> = row.get(7)?;
    Ok(Expense {
        id: row.get(0)?,
        user_id: row.get(1)?,
        category_id: row.get(2)?,
        amount: row.get(3)?,
        description: row.get(4)?,
        date: date_column(row, 5)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: updated_at_str.as_deref().map(parse_datetime),
    })
}

/// A monthly sample expense and the template category it belongs to
#[derive(Debug, Clone, Copy)]
struct SampleExpense {
    category: &'static str,
    description: &'static str,
    base_amount: f64,
    day: u32,
}

const SAMPLE_EXPENSES: [SampleExpense; 5] = [
    SampleExpense {
        category: "Groceries",
        description: "Weekly shopping",
        base_amount: 120.0,
        day: 4,
    },
    SampleExpense {
        category: "Transportation",
        description: "Bus pass",
        base_amount: 45.0,
        day: 1,
    },
    SampleExpense {
        category: "Housing",
        description: "Rent",
        base_amount: 900.0,
        day: 1,
    },
    SampleExpense {
        category: "Utilities",
        description: "Electricity bill",
        base_amount: 75.0,
        day: 15,
    },
    SampleExpense {
        category: "Health",
        description: "Pharmacy",
        base_amount: 30.0,
        day: 20,
    },
];

/// Match samples to categories by name; samples whose category the user
/// lacks take the remaining categories in list order
fn assign_samples(categories: &[Category]) -> Vec<(i64, SampleExpense)> {
    let mut remaining: Vec<&Category> = categories.iter().collect();
    let mut unmatched = Vec::new();
    let mut assigned = Vec::new();

    for sample in SAMPLE_EXPENSES {
        match remaining
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(sample.category))
        {
            Some(pos) => assigned.push((remaining.remove(pos).id, sample)),
            None => unmatched.push(sample),
        }
    }

    assigned.extend(
        remaining
            .into_iter()
            .zip(unmatched)
            .map(|(category, sample)| (category.id, sample)),
    );
    assigned
}

impl Database {
    /// Make sure `category_id` is one of the user's categories
    fn ensure_category(&self, user_id: i64, category_id: i64) -> Result<()> {
        if self.get_category(user_id, category_id)?.is_none() {
            return Err(Error::NotFound("Category not found".to_string()));
        }
        Ok(())
    }

    /// Record a new expense
    pub fn create_expense(&self, user_id: i64, expense: &NewExpense) -> Result<i64> {
        expense.validate().map_err(Error::InvalidData)?;
        self.ensure_category(user_id, expense.category_id)?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO expenses (user_id, category_id, amount, description, date)
            VALUES (?, ?, ?, ?, ?)
            "#,
            params![
                user_id,
                expense.category_id,
                expense.amount,
                expense.description.trim(),
                expense.date.format(DATE_FORMAT).to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// Get one of a user's expenses
    pub fn get_expense(&self, user_id: i64, id: i64) -> Result<Option<Expense>> {
        let conn = self.conn()?;
        let expense = conn
            .query_row(
                &format!(
                    "SELECT {} FROM expenses WHERE id = ? AND user_id = ?",
                    EXPENSE_COLUMNS
                ),
                params![id, user_id],
                map_expense,
            )
            .optional()?;
        Ok(expense)
    }

    /// List a user's expenses, newest first
    pub fn list_expenses(&self, user_id: i64, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let conn = self.conn()?;

        let mut sql = format!("SELECT {} FROM expenses WHERE user_id = ?", EXPENSE_COLUMNS);
        let mut query_params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];

        if let Some(from) = filter.from {
            sql.push_str(" AND date >= ?");
            query_params.push(Box::new(from.format(DATE_FORMAT).to_string()));
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND date <= ?");
            query_params.push(Box::new(to.format(DATE_FORMAT).to_string()));
        }
        if let Some(category_id) = filter.category_id {
            sql.push_str(" AND category_id = ?");
            query_params.push(Box::new(category_id));
        }

        sql.push_str(" ORDER BY date DESC, id DESC");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            query_params.push(Box::new(limit));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> =
            query_params.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let expenses = stmt
            .query_map(param_refs.as_slice(), map_expense)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(expenses)
    }

    /// Replace the fields of an existing expense
    pub fn update_expense(&self, user_id: i64, id: i64, expense: &NewExpense) -> Result<()> {
        expense.validate().map_err(Error::InvalidData)?;
        self.ensure_category(user_id, expense.category_id)?;

        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
            UPDATE expenses
            SET category_id = ?, amount = ?, description = ?, date = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ? AND user_id = ?
            "#,
            params![
                expense.category_id,
                expense.amount,
                expense.description.trim(),
                expense.date.format(DATE_FORMAT).to_string(),
                id,
                user_id,
            ],
        )?;

        if updated == 0 {
            return Err(Error::NotFound("Expense not found".to_string()));
        }
        Ok(())
    }

    /// Delete an expense; returns false if it did not exist
    pub fn delete_expense(&self, user_id: i64, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM expenses WHERE id = ? AND user_id = ?",
            params![id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Insert sample expenses for the three months ending at `today`
    ///
    /// Each sample goes to the category of the same name, or to another of
    /// the user's categories when that one is missing (seeding the templates
    /// if the user has none). Amounts grow month over month so the analytics have a
    /// trend to show. Dates never pass `today`. Returns the number created.
    pub fn seed_expenses(&self, user_id: i64, today: NaiveDate) -> Result<usize> {
        let mut categories = self.list_categories(user_id)?;
        if categories.is_empty() {
            self.seed_categories(user_id)?;
            categories = self.list_categories(user_id)?;
        }

        let samples = assign_samples(&categories);
        let month_start = today.with_day(1).unwrap_or(today);
        let mut created = 0;

        for months_back in (0..3u32).rev() {
            let Some(start) = month_start.checked_sub_months(Months::new(months_back)) else {
                continue;
            };
            let growth = 1.0 + 0.1 * f64::from(2 - months_back);

            for (category_id, sample) in &samples {
                let date = start
                    .with_day(sample.day)
                    .unwrap_or(start)
                    .min(today);
                self.create_expense(
                    user_id,
                    &NewExpense {
                        category_id: *category_id,
                        amount: (sample.base_amount * growth * 100.0).round() / 100.0,
                        description: sample.description.to_string(),
                        date,
                    },
                )?;
                created += 1;
            }
        }

        info!(user_id, created, "Seeded sample expenses");
        Ok(created)
    }
}
