//! Spending reports and analytics

use chrono::NaiveDate;
use rusqlite::params;
use tracing::debug;

use super::{Database, DATE_FORMAT};
use crate::analytics::{self, AnalyticsReport, MonthKey};
use crate::error::Result;
use crate::models::*;

impl Database {
    /// Monthly totals for one calendar year
    ///
    /// Only months with spending are listed. Each month's change is measured
    /// against the previous listed month.
    pub fn get_monthly_expenses(&self, user_id: i64, year: i32) -> Result<MonthlyExpensesReport> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT CAST(strftime('%m', date) AS INTEGER) AS month,
                   SUM(amount), COUNT(*)
            FROM expenses
            WHERE user_id = ?1 AND strftime('%Y', date) = ?2
            GROUP BY month
            ORDER BY month
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, format!("{:04}", year)], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut previous: Option<f64> = None;
        let monthly_expenses = rows
            .into_iter()
            .map(|(month, total_amount, count)| {
                let change_percent = previous
                    .map(|prev| analytics::percentage_change(prev, total_amount))
                    .unwrap_or(0.0);
                previous = Some(total_amount);
                MonthlyExpense {
                    month: MonthKey { year, month }.to_string(),
                    total_amount,
                    count,
                    change_percent,
                }
            })
            .collect();

        Ok(MonthlyExpensesReport {
            year,
            monthly_expenses,
        })
    }

    /// Totals per category for an optional date range, largest first
    pub fn get_expense_summary(
        &self,
        user_id: i64,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<ExpenseSummary> {
        let conn = self.conn()?;
        let from = from.map(|d| d.format(DATE_FORMAT).to_string());
        let to = to.map(|d| d.format(DATE_FORMAT).to_string());

        let mut stmt = conn.prepare(
            r#"
            SELECT c.id, COALESCE(c.name, ?4), SUM(e.amount), COUNT(*)
            FROM expenses e
            LEFT JOIN categories c ON c.id = e.category_id AND c.user_id = e.user_id
            WHERE e.user_id = ?1
              AND (?2 IS NULL OR e.date >= ?2)
              AND (?3 IS NULL OR e.date <= ?3)
            GROUP BY c.id
            ORDER BY SUM(e.amount) DESC, COALESCE(c.name, ?4)
            "#,
        )?;

        let rows = stmt
            .query_map(params![user_id, from, to, UNCATEGORIZED], |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let grand_total: f64 = rows.iter().map(|(_, _, total, _)| total).sum();
        let expense_count: i64 = rows.iter().map(|(_, _, _, count)| count).sum();

        let categories = rows
            .into_iter()
            .map(|(category_id, name, total, count)| CategoryTotal {
                category_id,
                name,
                total,
                count,
                percentage: analytics::share_percent(total, grand_total),
            })
            .collect();

        Ok(ExpenseSummary {
            grand_total,
            expense_count,
            categories,
        })
    }

    /// Analytics report for a user
    ///
    /// The filter's category narrows both the history and the window; its
    /// date bounds narrow only the window, so recommendations always reflect
    /// the full spending history.
    pub fn get_analytics(&self, user_id: i64, filter: &ExpenseFilter) -> Result<AnalyticsReport> {
        let categories = self.list_categories(user_id)?;

        let history = self.list_expenses(
            user_id,
            &ExpenseFilter {
                category_id: filter.category_id,
                ..Default::default()
            },
        )?;
        let window = self.list_expenses(
            user_id,
            &ExpenseFilter {
                limit: None,
                ..filter.clone()
            },
        )?;

        debug!(
            user_id,
            history = history.len(),
            window = window.len(),
            "Building analytics report"
        );

        Ok(analytics::build_report(&categories, &history, &window))
    }
}
