#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use expense_tracker_server::auth::create_user;
use expense_tracker_server::database::{Db, init_db};
use expense_tracker_server::models::{AmountInput, ExpensePayload, User};
use expense_tracker_server::validation::{ValidExpense, validate_payload};
use expense_tracker_server::{AppState, build_app};
use serde_json::Value;
use tempfile::{TempDir, tempdir};
use tower::ServiceExt;

pub const TEST_SECRET: &str =
    "test-session-secret-that-is-definitely-longer-than-sixty-four-bytes-0123456789";
pub const TEST_PASSWORD: &str = "password123";

pub async fn setup_test_environment() -> (Db, TempDir) {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    (db, temp_dir)
}

pub async fn create_test_user(db: &Db, email: &str) -> User {
    create_user(db, "Test User", email, TEST_PASSWORD)
        .await
        .unwrap_or_else(|e| panic!("Failed to create test user {}: {}", email, e))
}

pub fn valid_expense(category: &str, amount: f64, date: &str) -> ValidExpense {
    validate_payload(&ExpensePayload {
        category: Some(category.to_string()),
        amount: Some(AmountInput::Number(amount)),
        date: Some(date.to_string()),
        description: None,
    })
    .expect("test expense should validate")
}

pub async fn setup_test_app() -> (Router, Db, TempDir) {
    let (db, temp_dir) = setup_test_environment().await;
    let state = AppState {
        db: db.clone(),
        session_expiry_hours: 24,
    };
    let app = build_app(state, TEST_SECRET).expect("Failed to build app");
    (app, db, temp_dir)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text)
            .unwrap_or_else(|e| panic!("Response is not JSON ({}): {}", e, self.text))
    }
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");

    let status = response.status();
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    TestResponse {
        status,
        cookie,
        content_type,
        text: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// Registers a fresh account and returns its session cookie.
pub async fn register_and_login(app: &Router, email: &str) -> String {
    let response = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({
            "name": "Test User",
            "email": email,
            "password": TEST_PASSWORD,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    response.cookie.expect("register should set a session cookie")
}

pub async fn add_expense(app: &Router, cookie: &str, category: &str, amount: f64, date: &str) -> Value {
    let response = send(
        app,
        Method::POST,
        "/api/expenses",
        Some(cookie),
        Some(serde_json::json!({
            "category": category,
            "amount": amount,
            "date": date,
        })),
    )
    .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
    response.json()["expense"].clone()
}
