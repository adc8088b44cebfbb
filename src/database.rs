use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::hash_password;
use crate::constants::DATABASE_FILE;
use crate::utils::now_rfc3339;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    NOT NULL,
    email          TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL,
    created_at     TEXT    NOT NULL,
    last_login     TEXT,
    is_active      INTEGER NOT NULL DEFAULT 1
);
"#;

const CREATE_SESSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL REFERENCES users(id),
    created_at  TEXT    NOT NULL,
    expires_at  TEXT    NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 1
);
"#;

const CREATE_EXPENSES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS expenses (
    id           TEXT    PRIMARY KEY,
    user_id      TEXT    NOT NULL REFERENCES users(id),
    category     TEXT    NOT NULL,
    amount       REAL    NOT NULL,
    date         TEXT    NOT NULL,
    description  TEXT    NOT NULL DEFAULT '',
    created_at   TEXT    NOT NULL,
    updated_at   TEXT    NOT NULL
);
"#;

const CREATE_PREFERENCES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS user_preferences (
    user_id        TEXT    PRIMARY KEY REFERENCES users(id),
    currency       TEXT    NOT NULL,
    date_format    TEXT    NOT NULL,
    theme          TEXT    NOT NULL,
    notifications  INTEGER NOT NULL
);
"#;

const CREATE_EXPENSES_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses (user_id, date)";

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) `expenses.db` under `data_dir` and ensures the schema.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(DATABASE_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    for statement in [
        CREATE_USERS_TABLE,
        CREATE_SESSIONS_TABLE,
        CREATE_EXPENSES_TABLE,
        CREATE_PREFERENCES_TABLE,
        CREATE_EXPENSES_USER_INDEX,
    ] {
        conn.execute(statement, ()).await?;
    }

    tracing::debug!(data_dir, "database schema ready");
    Ok(Arc::new(RwLock::new(conn)))
}

struct DemoExpense {
    category: &'static str,
    amount: f64,
    date: &'static str,
    description: &'static str,
}

/// Inserts two demo accounts with a few expenses when no user exists yet.
/// Returns whether anything was written.
pub async fn seed_demo_data(db: &Db) -> Result<bool> {
    let conn = db.write().await;

    let mut rows = conn.query("SELECT COUNT(*) FROM users", ()).await?;
    let user_count: i64 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };
    if user_count > 0 {
        return Ok(false);
    }

    let demo_users = [
        (
            "John Doe",
            "john@example.com",
            "password123",
            vec![
                DemoExpense {
                    category: "Food",
                    amount: 25.50,
                    date: "2024-01-15",
                    description: "Lunch at restaurant",
                },
                DemoExpense {
                    category: "Transport",
                    amount: 10.00,
                    date: "2024-01-16",
                    description: "Taxi fare",
                },
                DemoExpense {
                    category: "Entertainment",
                    amount: 50.00,
                    date: "2024-01-17",
                    description: "Movie tickets",
                },
            ],
        ),
        (
            "Jane Smith",
            "jane@example.com",
            "admin",
            vec![DemoExpense {
                category: "Shopping",
                amount: 75.25,
                date: "2024-01-18",
                description: "Clothing purchase",
            }],
        ),
    ];

    for (name, email, password, expenses) in demo_users {
        let user_id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        let hash = hash_password(password)?;
        conn.execute(
            "INSERT INTO users (id, name, email, password_hash, created_at, is_active) VALUES (?, ?, ?, ?, ?, 1)",
            (user_id.as_str(), name, email, hash.as_str(), now.as_str()),
        )
        .await?;

        for expense in expenses {
            let expense_id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO expenses (id, user_id, category, amount, date, description, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                (
                    expense_id.as_str(),
                    user_id.as_str(),
                    expense.category,
                    expense.amount,
                    expense.date,
                    expense.description,
                    now.as_str(),
                    now.as_str(),
                ),
            )
            .await?;
        }
        tracing::info!(email, "seeded demo user");
    }

    Ok(true)
}
