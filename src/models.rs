use serde::{Deserialize, Serialize};

use crate::aggregate::{SortDirection, SortKey};
use crate::constants::{DEFAULT_CURRENCY, DEFAULT_DATE_FORMAT, DEFAULT_THEME};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
    pub last_login: Option<String>,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct RegisterPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub user: PublicUser,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        MessageResponse {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
    pub is_active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub user_id: String,
    pub category: String,
    pub amount: f64,
    pub date: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Amount as submitted: a JSON number or the raw text of a form field.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ExpensePayload {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ExpenseResponse {
    pub success: bool,
    pub message: String,
    pub expense: Expense,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ExpenseQuery {
    pub month: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct MonthQuery {
    pub month: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: ExportFormat,
}

/// One entry of the browser storage blob (`expense-tracker:v1`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StoredExpense {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct CountResponse {
    pub success: bool,
    pub count: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Preferences {
    pub user_id: String,
    pub currency: String,
    pub date_format: String,
    pub theme: String,
    pub notifications: bool,
}

impl Preferences {
    pub fn defaults_for(user_id: &str) -> Self {
        Preferences {
            user_id: user_id.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            theme: DEFAULT_THEME.to_string(),
            notifications: true,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PreferencesPayload {
    pub currency: Option<String>,
    pub date_format: Option<String>,
    pub theme: Option<String>,
    pub notifications: Option<bool>,
}
