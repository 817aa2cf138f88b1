//! Domain models for Outlay

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC string; never leaves the server
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A user-defined label for grouping expenses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A dated monetary record belonging to a user and a category
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for creating or replacing an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category_id: i64,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
}

impl NewExpense {
    /// Check the invariants the database relies on
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err("Amount must be a positive number".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Missing description".to_string());
        }
        Ok(())
    }
}

/// Filter for listing expenses; each bound applies independently
#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category_id: Option<i64>,
    pub limit: Option<i64>,
}

/// One month of spending from the monthly aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpense {
    /// `YYYY-M` key
    pub month: String,
    pub total_amount: f64,
    pub count: i64,
    /// Change against the previous month in the list
    pub change_percent: f64,
}

/// Monthly totals for a calendar year
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyExpensesReport {
    pub year: i32,
    pub monthly_expenses: Vec<MonthlyExpense>,
}

/// Spending for one category with its share of the grand total
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// None for expenses whose category no longer exists
    pub category_id: Option<i64>,
    pub name: String,
    pub total: f64,
    pub count: i64,
    pub percentage: f64,
}

/// Category totals report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub grand_total: f64,
    pub expense_count: i64,
    pub categories: Vec<CategoryTotal>,
}

/// Row counts for `outlay status`
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub users: i64,
    pub categories: i64,
    pub expenses: i64,
}

/// Label used for expenses without a known category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Starter categories created by the seed operation
pub const TEMPLATE_CATEGORIES: [(&str, &str); 10] = [
    ("Food", "Expenses related to food and dining."),
    ("Transportation", "Expenses related to transport."),
    ("Housing", "Expenses for housing or rent."),
    (
        "Utilities",
        "Expenses for utilities such as water and electricity",
    ),
    ("Health", "Medical expenses and health-related costs."),
    ("Entertainment", "Expenses for entertainment and leisure"),
    ("Groceries", "Expenses for purchasing groceries."),
    ("Education", "Expenses for educational purposes."),
    ("Clothing", "Expenses for clothing and personal items."),
    ("Miscellaneous", "Other miscellaneous expenses."),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn new_expense(amount: f64, description: &str) -> NewExpense {
        NewExpense {
            category_id: 1,
            amount,
            description: description.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_new_expense_validation() {
        assert!(new_expense(12.5, "Lunch").validate().is_ok());
        assert!(new_expense(0.0, "Lunch").validate().is_err());
        assert!(new_expense(-3.0, "Lunch").validate().is_err());
        assert!(new_expense(f64::NAN, "Lunch").validate().is_err());
        assert!(new_expense(5.0, "   ").validate().is_err());
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let user = User {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_expense_serializes_camel_case() {
        let expense = Expense {
            id: 7,
            user_id: 1,
            category_id: 3,
            amount: 42.0,
            description: "Books".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            created_at: Utc::now(),
            updated_at: None,
        };

        let json = serde_json::to_value(&expense).unwrap();
        assert_eq!(json["categoryId"], 3);
        assert_eq!(json["date"], "2024-02-01");
        assert!(json.get("updatedAt").is_none());
    }
}
