use axum::{
    Json, Router,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

pub mod aggregate;
pub mod auth;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod expenses;
pub mod export;
pub mod extractors;
pub mod models;
pub mod preferences;
pub mod sessions;
pub mod utils;
pub mod validation;

use crate::constants::SESSION_NAME;
use crate::database::Db;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub session_expiry_hours: i64,
}

/// Assembles every route behind the signed cookie session layer.
pub fn build_app(state: AppState, session_secret: &str) -> anyhow::Result<Router> {
    let key = Key::try_from(session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {:?}", e))?;

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::hours(
            state.session_expiry_hours,
        )))
        .with_signed(key);

    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route(
            "/expenses",
            get(expenses::list_expenses)
                .post(expenses::create_expense)
                .delete(expenses::clear_expenses),
        )
        .route("/expenses/stats", get(expenses::expense_stats))
        .route("/expenses/categories", get(expenses::category_breakdown))
        .route("/expenses/monthly", get(expenses::monthly_breakdown))
        .route("/expenses/summary", get(expenses::expense_summary))
        .route("/expenses/export", get(expenses::export_expenses))
        .route("/expenses/import", post(expenses::import_expenses))
        .route(
            "/expenses/{id}",
            put(expenses::update_expense).delete(expenses::delete_expense),
        )
        .route(
            "/preferences",
            get(preferences::get_preferences).put(preferences::put_preferences),
        );

    Ok(Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(session_layer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
