//! Expense command implementations

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use outlay_core::analytics::category_totals;
use outlay_core::db::Database;
use outlay_core::models::{Category, ExpenseFilter, NewExpense, User};

use super::truncate;

/// Find a category by ID or by (case-insensitive) name
pub fn find_category(db: &Database, user: &User, name_or_id: &str) -> Result<Category> {
    let categories = db.list_categories(user.id)?;

    if let Ok(id) = name_or_id.parse::<i64>() {
        if let Some(category) = categories.iter().find(|c| c.id == id) {
            return Ok(category.clone());
        }
    }

    categories
        .into_iter()
        .find(|c| c.name.eq_ignore_ascii_case(name_or_id.trim()))
        .with_context(|| format!("Category not found: {}", name_or_id))
}

pub fn cmd_expenses_list(db: &Database, user: &User, limit: i64) -> Result<()> {
    let expenses = db.list_expenses(
        user.id,
        &ExpenseFilter {
            limit: Some(limit),
            ..Default::default()
        },
    )?;

    if expenses.is_empty() {
        println!("No expenses recorded for {}.", user.email);
        return Ok(());
    }

    let categories = db.list_categories(user.id)?;
    let names: std::collections::HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    println!();
    println!("💸 Recent expenses for {}", user.email);
    println!("   ─────────────────────────────────────────────────────────────");
    for expense in &expenses {
        println!(
            "   {:>4}  {}  {:>10.2}  {:<16} {}",
            expense.id,
            expense.date,
            expense.amount,
            truncate(names.get(&expense.category_id).copied().unwrap_or("?"), 16),
            truncate(&expense.description, 40)
        );
    }

    println!();
    println!("   By category (listed expenses)");
    for total in category_totals(&categories, &expenses) {
        println!(
            "   {:<20} {:>10.2}  {:>5.1}%",
            truncate(&total.name, 20),
            total.total,
            total.percentage
        );
    }

    Ok(())
}

pub fn cmd_expenses_add(
    db: &Database,
    user: &User,
    amount: f64,
    description: &str,
    date: &str,
    category: &str,
) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be a positive number");
    }
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .context("Invalid date format (use YYYY-MM-DD)")?;
    let category = find_category(db, user, category)?;

    let id = db.create_expense(
        user.id,
        &NewExpense {
            category_id: category.id,
            amount,
            description: description.to_string(),
            date,
        },
    )?;

    println!(
        "✅ Recorded {:.2} for '{}' under {} (ID: {})",
        amount, description, category.name, id
    );
    Ok(())
}
