//! Filtering and aggregation over a user's expenses.
//!
//! Every read endpoint funnels through these functions, so the list, the
//! totals and the per-category breakdown always agree on what a filter
//! means.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{Expense, ExpenseQuery};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// `YYYY-MM` month key.
    pub month: Option<String>,
    /// Exact category label.
    pub category: Option<String>,
    /// Case-insensitive substring matched against category and description.
    pub search: Option<String>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ExpenseFilter {
    pub fn new(month: Option<&str>, category: Option<&str>, search: Option<&str>) -> Self {
        ExpenseFilter {
            month: non_blank(month),
            // Categories are matched exactly, surrounding spaces included.
            category: category.filter(|c| !c.is_empty()).map(str::to_string),
            search: non_blank(search).map(|s| s.to_lowercase()),
        }
    }

    pub fn month_only(&self) -> Self {
        ExpenseFilter {
            month: self.month.clone(),
            ..Default::default()
        }
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        matches_month(expense, self.month.as_deref())
            && matches_category(expense, self.category.as_deref())
            && matches_search(expense, self.search.as_deref())
    }
}

impl From<&ExpenseQuery> for ExpenseFilter {
    fn from(query: &ExpenseQuery) -> Self {
        ExpenseFilter::new(
            query.month.as_deref(),
            query.category.as_deref(),
            query.search.as_deref(),
        )
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub month: String,
    pub total: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExpenseStats {
    pub total_expenses: usize,
    pub total_amount: f64,
    pub average_amount: f64,
    pub min_amount: f64,
    pub max_amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Summary {
    pub expenses: Vec<Expense>,
    pub table_total: f64,
    pub month_total: f64,
    pub category_totals: Vec<CategoryTotal>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Date,
    Category,
    Amount,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        SortState {
            key: SortKey::Date,
            direction: SortDirection::Desc,
        }
    }
}

/// Month key of a date string: its first seven characters.
pub fn month_key(date: &str) -> Option<&str> {
    date.get(..7)
}

pub fn matches_month(expense: &Expense, month: Option<&str>) -> bool {
    match month {
        Some(month) => month_key(&expense.date) == Some(month),
        None => true,
    }
}

pub fn matches_category(expense: &Expense, category: Option<&str>) -> bool {
    match category {
        Some(category) => expense.category == category,
        None => true,
    }
}

/// `search` must already be lowercased.
pub fn matches_search(expense: &Expense, search: Option<&str>) -> bool {
    match search {
        Some(search) => {
            expense.category.to_lowercase().contains(search)
                || expense.description.to_lowercase().contains(search)
        }
        None => true,
    }
}

pub fn filter_expenses(expenses: &[Expense], filter: &ExpenseFilter) -> Vec<Expense> {
    expenses
        .iter()
        .filter(|e| filter.matches(e))
        .cloned()
        .collect()
}

pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Per-category sums, largest first. Categories with equal totals keep the
/// order in which they first appear.
pub fn category_totals(expenses: &[Expense]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    for expense in expenses {
        match totals.iter_mut().find(|t| t.category == expense.category) {
            Some(entry) => entry.total += expense.amount,
            None => totals.push(CategoryTotal {
                category: expense.category.clone(),
                total: expense.amount,
            }),
        }
    }
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals
}

/// Per-month sums, most recent month first. Dates too short to carry a
/// month key are skipped.
pub fn monthly_totals(expenses: &[Expense]) -> Vec<MonthlyTotal> {
    let mut totals: Vec<MonthlyTotal> = Vec::new();
    for expense in expenses {
        let Some(month) = month_key(&expense.date) else {
            continue;
        };
        match totals.iter_mut().find(|t| t.month == month) {
            Some(entry) => entry.total += expense.amount,
            None => totals.push(MonthlyTotal {
                month: month.to_string(),
                total: expense.amount,
            }),
        }
    }
    totals.sort_by(|a, b| b.month.cmp(&a.month));
    totals
}

/// Builds the two filter scopes at once: the table scope (month, category
/// and search) and the month scope (month only).
pub fn summarize(expenses: &[Expense], filter: &ExpenseFilter) -> Summary {
    let table = filter_expenses(expenses, filter);
    let month = filter_expenses(expenses, &filter.month_only());

    Summary {
        table_total: total(&table),
        month_total: total(&month),
        category_totals: category_totals(&month),
        expenses: table,
    }
}

pub fn compare_by(a: &Expense, b: &Expense, key: SortKey) -> Ordering {
    match key {
        SortKey::Date => a.date.cmp(&b.date),
        SortKey::Category => a.category.cmp(&b.category),
        SortKey::Amount => a.amount.total_cmp(&b.amount),
    }
}

/// Stable sort: equal keys keep their relative order in either direction.
pub fn sort_expenses(expenses: &mut [Expense], state: SortState) {
    expenses.sort_by(|a, b| {
        let ordering = compare_by(a, b, state.key);
        match state.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

/// Column-header click: the active ascending column flips to descending,
/// anything else sorts ascending.
pub fn toggle_sort(current: SortState, key: SortKey) -> SortState {
    let direction = if current.key == key && current.direction == SortDirection::Asc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };
    SortState { key, direction }
}

/// Column sort asked for by a query. A bare column sorts ascending and a
/// bare direction applies to the date column.
pub fn requested_sort(query: &ExpenseQuery) -> Option<SortState> {
    if query.sort.is_none() && query.direction.is_none() {
        return None;
    }
    Some(SortState {
        key: query.sort.unwrap_or(SortKey::Date),
        direction: query.direction.unwrap_or(SortDirection::Asc),
    })
}

/// Applies `requested`, or newest-first when nothing was asked for.
pub fn order_expenses(expenses: &mut [Expense], requested: Option<SortState>) {
    match requested {
        Some(state) => sort_expenses(expenses, state),
        None => sort_newest_first(expenses),
    }
}

/// Newest date first, then newest creation time first.
pub fn sort_newest_first(expenses: &mut [Expense]) {
    expenses.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

pub fn stats(expenses: &[Expense]) -> ExpenseStats {
    if expenses.is_empty() {
        return ExpenseStats {
            total_expenses: 0,
            total_amount: 0.0,
            average_amount: 0.0,
            min_amount: 0.0,
            max_amount: 0.0,
        };
    }

    let total_amount = total(expenses);
    let min_amount = expenses
        .iter()
        .map(|e| e.amount)
        .fold(f64::INFINITY, f64::min);
    let max_amount = expenses
        .iter()
        .map(|e| e.amount)
        .fold(f64::NEG_INFINITY, f64::max);

    ExpenseStats {
        total_expenses: expenses.len(),
        total_amount,
        average_amount: total_amount / expenses.len() as f64,
        min_amount,
        max_amount,
    }
}
