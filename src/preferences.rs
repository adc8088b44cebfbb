use axum::{Json, extract::State};

use crate::AppState;
use crate::database::Db;
use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::models::{Preferences, PreferencesPayload};
use crate::utils::flag;

pub fn extract_preferences_from_row(row: &libsql::Row) -> anyhow::Result<Preferences> {
    let notifications: i64 = row.get(4)?;
    Ok(Preferences {
        user_id: row.get(0)?,
        currency: row.get(1)?,
        date_format: row.get(2)?,
        theme: row.get(3)?,
        notifications: flag(notifications),
    })
}

/// Stored preferences, or the defaults when the user never saved any.
pub async fn load_preferences(db: &Db, user_id: &str) -> anyhow::Result<Preferences> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT user_id, currency, date_format, theme, notifications FROM user_preferences WHERE user_id = ?",
            [user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => extract_preferences_from_row(&row),
        None => Ok(Preferences::defaults_for(user_id)),
    }
}

/// Missing or empty fields fall back to the defaults, not to the previously
/// stored value.
pub fn merge_preferences(user_id: &str, payload: &PreferencesPayload) -> Preferences {
    let defaults = Preferences::defaults_for(user_id);
    let pick = |value: &Option<String>, fallback: String| {
        value
            .as_deref()
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or(fallback)
    };

    Preferences {
        user_id: user_id.to_string(),
        currency: pick(&payload.currency, defaults.currency),
        date_format: pick(&payload.date_format, defaults.date_format),
        theme: pick(&payload.theme, defaults.theme),
        notifications: payload.notifications.unwrap_or(defaults.notifications),
    }
}

pub async fn save_preferences(db: &Db, preferences: &Preferences) -> anyhow::Result<()> {
    let conn = db.write().await;
    conn.execute(
        "INSERT INTO user_preferences (user_id, currency, date_format, theme, notifications) VALUES (?, ?, ?, ?, ?) \
         ON CONFLICT(user_id) DO UPDATE SET currency = excluded.currency, date_format = excluded.date_format, theme = excluded.theme, notifications = excluded.notifications",
        (
            preferences.user_id.as_str(),
            preferences.currency.as_str(),
            preferences.date_format.as_str(),
            preferences.theme.as_str(),
            preferences.notifications as i64,
        ),
    )
    .await?;
    Ok(())
}

pub async fn get_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Preferences>> {
    Ok(Json(load_preferences(&state.db, &user.id).await?))
}

pub async fn put_preferences(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(payload): ApiJson<PreferencesPayload>,
) -> ApiResult<Json<Preferences>> {
    let preferences = merge_preferences(&user.id, &payload);
    save_preferences(&state.db, &preferences).await?;
    tracing::debug!(user_id = %user.id, "preferences saved");
    Ok(Json(preferences))
}
