//! CLI command tests
//!
//! This module contains all tests for the CLI commands.

use chrono::NaiveDate;
use clap::Parser;
use outlay_core::db::Database;
use outlay_core::models::{ExpenseFilter, User};

use crate::cli::{CategoriesAction, Cli, Commands, ExpensesAction, ReportType};
use crate::commands::{self, truncate};

fn setup_test_db() -> (Database, User) {
    let db = Database::in_memory().unwrap();
    db.create_user("Test User", "test@example.com", "pw").unwrap();
    let user = db.get_user_by_email("test@example.com").unwrap().unwrap();
    (db, user)
}

// ========== Core Command Tests ==========

#[test]
fn test_cmd_init_and_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("outlay.db");

    assert!(commands::cmd_init(&path).is_ok());
    assert!(path.exists());
    assert!(commands::cmd_status(&path).is_ok());
}

#[test]
fn test_cmd_status_missing_db() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");

    assert!(commands::cmd_status(&path).is_ok());
    assert!(!path.exists(), "status must not create the database");
}

#[test]
fn test_resolve_user() {
    let (db, user) = setup_test_db();

    let found = commands::resolve_user(&db, "TEST@example.com").unwrap();
    assert_eq!(found.id, user.id);

    assert!(commands::resolve_user(&db, "nobody@example.com").is_err());
}

#[test]
fn test_parse_date_arg() {
    assert_eq!(commands::parse_date_arg(None, "--from").unwrap(), None);
    assert_eq!(
        commands::parse_date_arg(Some("2024-02-29"), "--from").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 29)
    );
    assert!(commands::parse_date_arg(Some("2024-02-30"), "--from").is_err());
}

#[test]
fn test_cmd_users() {
    let (db, _) = setup_test_db();
    assert!(commands::cmd_users(&db).is_ok());
}

// ========== Category Command Tests ==========

#[test]
fn test_cmd_categories_add_and_list() {
    let (db, user) = setup_test_db();

    assert!(commands::cmd_categories_add(&db, &user, "Books", "Reading").is_ok());
    assert!(commands::cmd_categories_list(&db, &user).is_ok());

    // Duplicate names fail
    assert!(commands::cmd_categories_add(&db, &user, "Books", "Again").is_err());
    assert_eq!(db.list_categories(user.id).unwrap().len(), 1);
}

#[test]
fn test_cmd_categories_seed() {
    let (db, user) = setup_test_db();

    assert!(commands::cmd_categories_seed(&db, &user).is_ok());
    assert_eq!(db.list_categories(user.id).unwrap().len(), 10);

    // Second seed is a no-op
    assert!(commands::cmd_categories_seed(&db, &user).is_ok());
    assert_eq!(db.list_categories(user.id).unwrap().len(), 10);
}

// ========== Expense Command Tests ==========

#[test]
fn test_cmd_expenses_add_by_name_and_id() {
    let (db, user) = setup_test_db();
    let category_id = db.create_category(user.id, "Food", "").unwrap();

    assert!(commands::cmd_expenses_add(&db, &user, 12.5, "Lunch", "2024-01-10", "food").is_ok());
    assert!(commands::cmd_expenses_add(
        &db,
        &user,
        8.0,
        "Snack",
        "2024-01-11",
        &category_id.to_string()
    )
    .is_ok());

    let expenses = db.list_expenses(user.id, &ExpenseFilter::default()).unwrap();
    assert_eq!(expenses.len(), 2);
    assert!(expenses.iter().all(|e| e.category_id == category_id));

    assert!(commands::cmd_expenses_list(&db, &user, 20).is_ok());
}

#[test]
fn test_cmd_expenses_add_rejects_bad_input() {
    let (db, user) = setup_test_db();
    db.create_category(user.id, "Food", "").unwrap();

    assert!(commands::cmd_expenses_add(&db, &user, -1.0, "Refund", "2024-01-10", "Food").is_err());
    assert!(commands::cmd_expenses_add(&db, &user, 5.0, "Lunch", "10/01/2024", "Food").is_err());
    assert!(commands::cmd_expenses_add(&db, &user, 5.0, "Lunch", "2024-01-10", "Travel").is_err());
    assert!(db
        .list_expenses(user.id, &ExpenseFilter::default())
        .unwrap()
        .is_empty());
}

// ========== Report Command Tests ==========

#[test]
fn test_report_commands() {
    let (db, user) = setup_test_db();
    db.seed_expenses(user.id, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        .unwrap();

    assert!(commands::cmd_report_summary(&db, &user, None, None).is_ok());
    assert!(commands::cmd_report_summary(&db, &user, Some("2024-06-01"), Some("2024-06-30")).is_ok());
    assert!(commands::cmd_report_monthly(&db, &user, Some(2024)).is_ok());
    assert!(commands::cmd_report_analytics(&db, &user, Some("2024-06-01"), None, None).is_ok());
    assert!(commands::cmd_report_analytics(&db, &user, Some("June"), None, None).is_err());
    assert!(commands::cmd_report_analytics(&db, &user, None, None, Some("2024-5")).is_ok());
    assert!(commands::cmd_report_analytics(&db, &user, None, None, Some("2024-13")).is_err());
}

#[test]
fn test_report_commands_empty() {
    let (db, user) = setup_test_db();

    assert!(commands::cmd_report_summary(&db, &user, None, None).is_ok());
    assert!(commands::cmd_report_monthly(&db, &user, None).is_ok());
    assert!(commands::cmd_report_analytics(&db, &user, None, None, None).is_ok());
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["outlay", "serve"]).unwrap();
    assert_eq!(cli.db.to_str(), Some("outlay.db"));
    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
        } => {
            assert_eq!(port, 8080);
            assert_eq!(host, "127.0.0.1");
            assert!(static_dir.is_none());
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_parse_nested_commands() {
    let cli = Cli::try_parse_from([
        "outlay",
        "--db",
        "/tmp/x.db",
        "expenses",
        "--user",
        "a@b.c",
        "add",
        "12.5",
        "Lunch",
        "2024-01-10",
        "Food",
    ])
    .unwrap();
    match cli.command {
        Commands::Expenses {
            user,
            action: Some(ExpensesAction::Add { amount, category, .. }),
        } => {
            assert_eq!(user, "a@b.c");
            assert_eq!(amount, 12.5);
            assert_eq!(category, "Food");
        }
        _ => panic!("expected expenses add"),
    }

    let cli = Cli::try_parse_from(["outlay", "categories", "-u", "a@b.c", "seed"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Categories {
            action: Some(CategoriesAction::Seed),
            ..
        }
    ));

    let cli = Cli::try_parse_from([
        "outlay", "report", "-u", "a@b.c", "analytics", "--month", "2024-3",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Report {
            report: ReportType::Analytics { month: Some(_), .. },
            ..
        }
    ));
    assert!(Cli::try_parse_from([
        "outlay", "report", "-u", "a@b.c", "analytics", "--month", "2024-3", "--from", "2024-01-01",
    ])
    .is_err());

    let cli =
        Cli::try_parse_from(["outlay", "report", "--user", "a@b.c", "monthly", "--year", "2023"])
            .unwrap();
    assert!(matches!(
        cli.command,
        Commands::Report {
            report: ReportType::Monthly { year: Some(2023) },
            ..
        }
    ));
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("a much longer description", 10), "a much ...");
    assert_eq!(truncate("café au lait", 7), "café...");
}
