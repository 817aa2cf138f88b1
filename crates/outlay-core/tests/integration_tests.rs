//! Integration tests for outlay-core
//!
//! These tests exercise the register → categorize → record → analyze workflow
//! against a real database file.

use chrono::NaiveDate;
use outlay_core::{
    analytics,
    db::Database,
    models::{ExpenseFilter, NewExpense},
    Error,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(category_id: i64, amount: f64, on: NaiveDate) -> NewExpense {
    NewExpense {
        category_id,
        amount,
        description: "Integration".to_string(),
        date: on,
    }
}

#[test]
fn test_full_tracking_workflow() {
    let db = Database::in_memory().expect("Failed to create in-memory database");

    let user_id = db
        .create_user("Grace", "grace@example.com", "hunter2")
        .expect("Failed to register");
    db.seed_categories(user_id).expect("Failed to seed categories");

    let categories = db.list_categories(user_id).unwrap();
    let food = categories.iter().find(|c| c.name == "Food").unwrap().id;
    let housing = categories.iter().find(|c| c.name == "Housing").unwrap().id;

    // Rising food spending, flat housing
    for (month, food_amount) in [(1, 200.0), (2, 250.0), (3, 300.0)] {
        db.create_expense(user_id, &expense(food, food_amount, date(2024, month, 10)))
            .unwrap();
        db.create_expense(user_id, &expense(housing, 1000.0, date(2024, month, 1)))
            .unwrap();
    }
    // An April splurge well above the food recommendation
    db.create_expense(user_id, &expense(food, 600.0, date(2024, 4, 2)))
        .unwrap();

    let report = db
        .get_analytics(
            user_id,
            &ExpenseFilter {
                from: Some(date(2024, 4, 1)),
                to: Some(date(2024, 4, 30)),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(report.total_spent, 600.0);
    assert_eq!(report.forecast, Some(600.0));
    assert_eq!(report.unusual_categories, vec!["Food".to_string()]);

    let housing_row = report
        .categories
        .iter()
        .find(|c| c.category_id == housing)
        .unwrap();
    assert_eq!(housing_row.trend, 0.0);
    assert_eq!(housing_row.recommended_budget, 1000);
    assert!(!housing_row.unusual);

    let summary = db.get_expense_summary(user_id, None, None).unwrap();
    assert_eq!(summary.expense_count, 7);
    assert_eq!(summary.categories[0].name, "Housing");
}

#[test]
fn test_reopen_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outlay.db");
    let path = path.to_str().unwrap();

    {
        let db = Database::new(path).unwrap();
        let user_id = db.create_user("Linus", "linus@example.com", "pw").unwrap();
        let category = db.create_category(user_id, "Books", "Reading").unwrap();
        db.create_expense(user_id, &expense(category, 42.0, date(2024, 5, 1)))
            .unwrap();
    }

    // Migrations are idempotent and data survives
    let db = Database::new(path).unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.users, 1);
    assert_eq!(stats.categories, 1);
    assert_eq!(stats.expenses, 1);
    assert_eq!(db.path(), path);
}

#[test]
fn test_category_in_use_survives_delete() {
    let db = Database::in_memory().unwrap();
    let user_id = db.create_user("Ken", "ken@example.com", "pw").unwrap();
    let category = db.create_category(user_id, "Travel", "").unwrap();
    let expense_id = db
        .create_expense(user_id, &expense(category, 80.0, date(2024, 6, 1)))
        .unwrap();

    assert!(matches!(
        db.delete_category(user_id, category),
        Err(Error::Conflict(_))
    ));

    db.delete_expense(user_id, expense_id).unwrap();
    db.delete_category(user_id, category).unwrap();
}

#[test]
fn test_monthly_totals_match_sql_aggregation() {
    let db = Database::in_memory().unwrap();
    let user_id = db.create_user("Barbara", "barbara@example.com", "pw").unwrap();
    let category = db.create_category(user_id, "Food", "").unwrap();

    for (m, d, amount) in [(1, 3, 10.0), (1, 20, 15.0), (2, 14, 40.0), (11, 1, 5.0)] {
        db.create_expense(user_id, &expense(category, amount, date(2024, m, d)))
            .unwrap();
    }

    let expenses = db.list_expenses(user_id, &ExpenseFilter::default()).unwrap();
    let in_memory = analytics::monthly_totals(&expenses);
    let from_sql = db.get_monthly_expenses(user_id, 2024).unwrap();

    assert_eq!(in_memory.len(), from_sql.monthly_expenses.len());
    for (a, b) in in_memory.iter().zip(&from_sql.monthly_expenses) {
        assert_eq!(a.month.to_string(), b.month);
        assert_eq!(a.total, b.total_amount);
        assert!((a.change_percent - b.change_percent).abs() < 1e-9);
    }
}
