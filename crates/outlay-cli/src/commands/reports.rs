//! Report command implementations

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, Months, Utc};
use outlay_core::analytics::{month_key, MonthKey};
use outlay_core::db::Database;
use outlay_core::models::{ExpenseFilter, User};

use super::{parse_date_arg, truncate};

pub fn cmd_report_summary(
    db: &Database,
    user: &User,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let from = parse_date_arg(from, "--from")?;
    let to = parse_date_arg(to, "--to")?;
    let summary = db.get_expense_summary(user.id, from, to)?;

    println!();
    println!("📊 Spending by category");
    println!("   ─────────────────────────────────────────────────────────────");

    if summary.categories.is_empty() {
        println!("   No expenses in this period.");
        return Ok(());
    }

    for category in &summary.categories {
        let bar_len = (category.percentage / 5.0).round() as usize;
        println!(
            "   {:<20} {:>10.2}  {:>5.1}%  {}",
            truncate(&category.name, 20),
            category.total,
            category.percentage,
            "█".repeat(bar_len)
        );
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!(
        "   {:<20} {:>10.2}  ({} expenses)",
        "Total", summary.grand_total, summary.expense_count
    );

    Ok(())
}

pub fn cmd_report_monthly(db: &Database, user: &User, year: Option<i32>) -> Result<()> {
    let year = year.unwrap_or_else(|| Utc::now().year());
    let report = db.get_monthly_expenses(user.id, year)?;

    println!();
    println!("📅 Monthly spending {}", report.year);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.monthly_expenses.is_empty() {
        println!("   No expenses in {}.", year);
        return Ok(());
    }

    for month in &report.monthly_expenses {
        let arrow = if month.change_percent > 0.0 {
            "↑"
        } else if month.change_percent < 0.0 {
            "↓"
        } else {
            " "
        };
        println!(
            "   {:<8} {:>10.2}  {:>3} expenses  {} {:>6.1}%",
            month.month, month.total_amount, month.count, arrow, month.change_percent
        );
    }

    Ok(())
}

pub fn cmd_report_analytics(
    db: &Database,
    user: &User,
    from: Option<&str>,
    to: Option<&str>,
    month: Option<&str>,
) -> Result<()> {
    let filter = match month {
        Some(month) => {
            let key: MonthKey = month
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("Invalid --month (use YYYY-M)")?;
            ExpenseFilter {
                from: key.first_day(),
                to: key.last_day(),
                ..Default::default()
            }
        }
        None => ExpenseFilter {
            from: parse_date_arg(from, "--from")?,
            to: parse_date_arg(to, "--to")?,
            ..Default::default()
        },
    };
    let report = db.get_analytics(user.id, &filter)?;
    let next_month = Utc::now()
        .date_naive()
        .checked_add_months(Months::new(1))
        .map(month_key)
        .unwrap_or_default();

    println!();
    println!("🔮 Budget analytics");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total spent: {:.2} ({} expenses)", report.total_spent, report.expense_count);
    match report.forecast {
        Some(forecast) => println!("   Forecast for {}: {:.2}", next_month, forecast),
        None => println!("   Forecast: not enough data"),
    }
    println!();

    for row in &report.categories {
        let flag = if row.unusual { "  ⚠️  unusual" } else { "" };
        println!(
            "   {:<20} actual {:>10.2}  avg {:>10.2}  trend {:>+6.1}%  budget {:>8}{}",
            truncate(&row.name, 20),
            row.actual_total,
            row.monthly_average,
            row.trend * 100.0,
            row.recommended_budget,
            flag
        );
    }

    println!();
    println!("   Recommended monthly budget: {}", report.total_recommended);
    if !report.unusual_categories.is_empty() {
        println!(
            "   ⚠️  Unusual spending in: {}",
            report.unusual_categories.join(", ")
        );
    }

    Ok(())
}
