use crate::constants::CSV_HEADER;
use crate::models::{AmountInput, Expense, StoredExpense};

/// Category cells are written as JSON string literals so embedded commas
/// and quotes survive.
fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

pub fn to_csv(expenses: &[Expense]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    let body: Vec<String> = expenses
        .iter()
        .map(|e| format!("{},{},{},{}", e.id, quote(&e.category), e.amount, e.date))
        .collect();
    out.push_str(&body.join("\n"));
    out
}

/// The browser storage layout: `[{id, category, amount, date}]`.
pub fn to_stored(expenses: &[Expense]) -> Vec<StoredExpense> {
    expenses
        .iter()
        .map(|e| StoredExpense {
            id: Some(e.id.clone()),
            category: Some(e.category.clone()),
            amount: Some(AmountInput::Number(e.amount)),
            date: Some(e.date.clone()),
        })
        .collect()
}
