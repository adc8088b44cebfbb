//! Expense input validation.
//!
//! The rules are deliberately lenient: only an empty category, a
//! non-numeric amount or an empty date are rejected. Zero and negative
//! amounts, impossible calendar dates and whitespace-only categories all
//! pass.

use crate::constants::ERR_EXPENSE_FIELDS;
use crate::error::ApiError;
use crate::models::{AmountInput, ExpensePayload};

/// Fields of an expense that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidExpense {
    pub category: String,
    pub amount: f64,
    pub date: String,
    pub description: String,
}

/// Converts a submitted amount to a number. Text is parsed after trimming;
/// empty text has no numeric value.
pub fn parse_amount(input: &AmountInput) -> Option<f64> {
    match input {
        AmountInput::Number(n) => Some(*n),
        AmountInput::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                text.parse::<f64>().ok()
            }
        }
    }
}

pub fn validate_expense(
    category: Option<&str>,
    amount: Option<&AmountInput>,
    date: Option<&str>,
) -> Result<(String, f64, String), ApiError> {
    let category = category.unwrap_or_default();
    let date = date.unwrap_or_default();
    let amount = amount.and_then(parse_amount);

    match amount {
        Some(amount) if !category.is_empty() && !date.is_empty() && amount.is_finite() => {
            Ok((category.to_string(), amount, date.to_string()))
        }
        _ => Err(ApiError::bad_request(ERR_EXPENSE_FIELDS)),
    }
}

pub fn validate_payload(payload: &ExpensePayload) -> Result<ValidExpense, ApiError> {
    let (category, amount, date) = validate_expense(
        payload.category.as_deref(),
        payload.amount.as_ref(),
        payload.date.as_deref(),
    )?;

    Ok(ValidExpense {
        category,
        amount,
        date,
        description: payload.description.clone().unwrap_or_default(),
    })
}
