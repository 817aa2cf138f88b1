//! Expense aggregation and trend projection
//!
//! Pure functions over slices of expenses. The database layer does the
//! coarse aggregation for summaries; this module does the per-category
//! monthly breakdown, the least-squares trend, budget recommendations,
//! the naive forecast and the unusual-spending flag.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::{Category, CategoryTotal, Expense, UNCATEGORIZED};

/// Actual spending above `recommended * 6 / 5` (120%) is flagged
pub const UNUSUAL_SPENDING_RATIO: (f64, f64) = (6.0, 5.0);

/// Number of most recent expenses averaged by [`forecast`]
pub const FORECAST_SAMPLE_SIZE: usize = 3;

/// A calendar month, ordered chronologically and displayed as `YYYY-M`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        self.first_day()?
            .checked_add_months(Months::new(1))?
            .pred_opt()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = String;

    /// Accepts `YYYY-M` and `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| format!("Invalid month key: {}", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("Invalid year in month key: {}", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("Invalid month in month key: {}", s))?;
        if !(1..=12).contains(&month) {
            return Err(format!("Month out of range in month key: {}", s));
        }
        Ok(Self { year, month })
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// `YYYY-M` key for the month containing `date`
pub fn month_key(date: NaiveDate) -> String {
    MonthKey::from_date(date).to_string()
}

/// Percentage change from `old_value` to `new_value`
///
/// From zero, any increase counts as 100% and no change as 0%.
pub fn percentage_change(old_value: f64, new_value: f64) -> f64 {
    if old_value == 0.0 {
        return if new_value == 0.0 { 0.0 } else { 100.0 };
    }
    (new_value - old_value) / old_value * 100.0
}

/// Sum amounts per calendar month
pub fn monthly_sums(expenses: &[Expense]) -> BTreeMap<MonthKey, f64> {
    let mut sums = BTreeMap::new();
    for expense in expenses {
        *sums.entry(MonthKey::from_date(expense.date)).or_insert(0.0) += expense.amount;
    }
    sums
}

/// Partition expenses by category, then by month, summing each cell
pub fn monthly_by_category(expenses: &[Expense]) -> BTreeMap<i64, BTreeMap<MonthKey, f64>> {
    let mut cells: BTreeMap<i64, BTreeMap<MonthKey, f64>> = BTreeMap::new();
    for expense in expenses {
        *cells
            .entry(expense.category_id)
            .or_default()
            .entry(MonthKey::from_date(expense.date))
            .or_insert(0.0) += expense.amount;
    }
    cells
}

/// One month of a series with its change against the previous entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyChange {
    pub month: MonthKey,
    pub total: f64,
    /// 0 for the first month of the series
    pub change_percent: f64,
}

/// Turn chronological monthly sums into a series with month-over-month change
pub fn with_changes(sums: &BTreeMap<MonthKey, f64>) -> Vec<MonthlyChange> {
    let mut previous: Option<f64> = None;
    sums.iter()
        .map(|(&month, &total)| {
            let change_percent = previous
                .map(|prev| percentage_change(prev, total))
                .unwrap_or(0.0);
            previous = Some(total);
            MonthlyChange {
                month,
                total,
                change_percent,
            }
        })
        .collect()
}

/// Overall monthly totals with month-over-month percentage change
pub fn monthly_totals(expenses: &[Expense]) -> Vec<MonthlyChange> {
    with_changes(&monthly_sums(expenses))
}

/// Ordinary least-squares slope of `values` against their index
pub fn linear_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let n_f = n as f64;
    let (mut sum_i, mut sum_v, mut sum_iv, mut sum_ii) = (0.0, 0.0, 0.0, 0.0);
    for (i, &v) in values.iter().enumerate() {
        let i = i as f64;
        sum_i += i;
        sum_v += v;
        sum_iv += i * v;
        sum_ii += i * i;
    }

    let denominator = n_f * sum_ii - sum_i * sum_i;
    if denominator == 0.0 {
        return 0.0;
    }
    (n_f * sum_iv - sum_i * sum_v) / denominator
}

/// Slope divided by the mean, so the trend reads as a fraction per month
pub fn normalized_trend(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    linear_slope(values) / mean
}

/// Next month's budget: the average scaled by the trend, rounded up
///
/// Never negative; a trend below -100% recommends zero.
pub fn recommended_budget(monthly_average: f64, trend: f64) -> i64 {
    (monthly_average * (1.0 + trend)).ceil().max(0.0) as i64
}

/// Naive next-month projection: mean of the most recent expense amounts
///
/// Recency is by date, with later ids winning ties. Returns None when
/// there are no expenses.
pub fn forecast(expenses: &[Expense]) -> Option<f64> {
    if expenses.is_empty() {
        return None;
    }

    let mut recent: Vec<&Expense> = expenses.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    recent.truncate(FORECAST_SAMPLE_SIZE);

    let sum: f64 = recent.iter().map(|e| e.amount).sum();
    Some(sum / recent.len() as f64)
}

/// Whether `actual` spending exceeds the recommendation by more than 20%
///
/// Compared as `actual * 5 > recommended * 6` so exactly 120% is never
/// flagged; `recommended * 1.2` rounds below the boundary for some budgets.
pub fn is_unusual(actual: f64, recommended: i64) -> bool {
    let (numerator, denominator) = UNUSUAL_SPENDING_RATIO;
    actual * denominator > recommended as f64 * numerator
}

/// Per-category totals with their share of the grand total, largest first
///
/// Expenses pointing at a category missing from `categories` are pooled
/// under [`UNCATEGORIZED`].
pub fn category_totals(categories: &[Category], expenses: &[Expense]) -> Vec<CategoryTotal> {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let mut buckets: BTreeMap<Option<i64>, (f64, i64)> = BTreeMap::new();
    for expense in expenses {
        let key = names
            .contains_key(&expense.category_id)
            .then_some(expense.category_id);
        let bucket = buckets.entry(key).or_insert((0.0, 0));
        bucket.0 += expense.amount;
        bucket.1 += 1;
    }

    let grand_total: f64 = buckets.values().map(|(total, _)| total).sum();

    let mut totals: Vec<CategoryTotal> = buckets
        .into_iter()
        .map(|(category_id, (total, count))| CategoryTotal {
            category_id,
            name: category_id
                .and_then(|id| names.get(&id).copied())
                .unwrap_or(UNCATEGORIZED)
                .to_string(),
            total,
            count,
            percentage: share_percent(total, grand_total),
        })
        .collect();

    totals.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
    });
    totals
}

/// `part` as a percentage of `whole`, 0 when the whole is 0
pub fn share_percent(part: f64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part / whole * 100.0
    }
}

/// Analytics for one category
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAnalytics {
    pub category_id: i64,
    pub name: String,
    /// Monthly totals from the history
    pub monthly: Vec<MonthlyChange>,
    pub monthly_average: f64,
    /// Normalized least-squares trend of the monthly totals
    pub trend: f64,
    pub recommended_budget: i64,
    /// Spending inside the requested window
    pub actual_total: f64,
    pub share_percent: f64,
    pub unusual: bool,
}

/// Full analytics report for a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_spent: f64,
    pub expense_count: usize,
    pub monthly: Vec<MonthlyChange>,
    pub categories: Vec<CategoryAnalytics>,
    pub total_recommended: i64,
    pub forecast: Option<f64>,
    pub unusual_categories: Vec<String>,
}

/// Build the analytics report
///
/// `history` drives averages, trends and recommendations; `window` is the
/// filtered set whose totals are compared against them.
pub fn build_report(
    categories: &[Category],
    history: &[Expense],
    window: &[Expense],
) -> AnalyticsReport {
    let names: HashMap<i64, &str> = categories
        .iter()
        .map(|c| (c.id, c.name.as_str()))
        .collect();

    let history_cells = monthly_by_category(history);

    let mut window_totals: BTreeMap<i64, f64> = BTreeMap::new();
    for expense in window {
        *window_totals.entry(expense.category_id).or_insert(0.0) += expense.amount;
    }
    let total_spent: f64 = window_totals.values().sum();

    let mut category_ids: Vec<i64> = history_cells.keys().copied().collect();
    category_ids.extend(window_totals.keys().copied());
    category_ids.sort_unstable();
    category_ids.dedup();

    let mut rows: Vec<CategoryAnalytics> = category_ids
        .into_iter()
        .map(|category_id| {
            let empty = BTreeMap::new();
            let cells = history_cells.get(&category_id).unwrap_or(&empty);
            let values: Vec<f64> = cells.values().copied().collect();

            let monthly_average = if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            };
            let trend = normalized_trend(&values);
            let recommended = recommended_budget(monthly_average, trend);
            let actual_total = window_totals.get(&category_id).copied().unwrap_or(0.0);

            CategoryAnalytics {
                category_id,
                name: names
                    .get(&category_id)
                    .copied()
                    .unwrap_or(UNCATEGORIZED)
                    .to_string(),
                monthly: with_changes(cells),
                monthly_average,
                trend,
                recommended_budget: recommended,
                actual_total,
                share_percent: share_percent(actual_total, total_spent),
                unusual: is_unusual(actual_total, recommended),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.actual_total
            .total_cmp(&a.actual_total)
            .then_with(|| a.name.cmp(&b.name))
    });

    let unusual_categories = rows
        .iter()
        .filter(|row| row.unusual)
        .map(|row| row.name.clone())
        .collect();

    AnalyticsReport {
        total_spent,
        expense_count: window.len(),
        monthly: monthly_totals(window),
        total_recommended: rows.iter().map(|row| row.recommended_budget).sum(),
        categories: rows,
        forecast: forecast(window),
        unusual_categories,
    }
}
