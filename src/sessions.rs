//! Server-side session records.
//!
//! A record is created on every successful login or registration and its id
//! is kept in the signed cookie session. Validation only checks that the
//! record is active and that its user still exists; `expires_at` is honoured
//! by [`cleanup_expired_sessions`] and by the cookie's own inactivity expiry.

use anyhow::Result;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::get_user_by_id;
use crate::database::Db;
use crate::models::{Session, User};
use crate::utils::{flag, format_timestamp, now_rfc3339};

pub fn extract_session_from_row(row: &libsql::Row) -> Result<Session> {
    let is_active: i64 = row.get(4)?;
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_at: row.get(2)?,
        expires_at: row.get(3)?,
        is_active: flag(is_active),
    })
}

pub async fn create_session(db: &Db, user_id: &str, lifetime: Duration) -> Result<Session> {
    let now = OffsetDateTime::now_utc();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        created_at: format_timestamp(now),
        expires_at: format_timestamp(now + lifetime),
        is_active: true,
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO sessions (id, user_id, created_at, expires_at, is_active) VALUES (?, ?, ?, ?, 1)",
        (
            session.id.as_str(),
            session.user_id.as_str(),
            session.created_at.as_str(),
            session.expires_at.as_str(),
        ),
    )
    .await?;

    Ok(session)
}

pub async fn get_session(db: &Db, session_id: &str) -> Result<Option<Session>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, user_id, created_at, expires_at, is_active FROM sessions WHERE id = ?",
            [session_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_session_from_row(&row)?)),
        None => Ok(None),
    }
}

/// Resolves an active session to its user. Expiry is not checked here.
pub async fn validate_session(db: &Db, session_id: &str) -> Result<Option<(Session, User)>> {
    let session = match get_session(db, session_id).await? {
        Some(session) if session.is_active => session,
        _ => return Ok(None),
    };

    let user = get_user_by_id(db, &session.user_id).await?;
    Ok(user.map(|user| (session, user)))
}

pub async fn deactivate_session(db: &Db, session_id: &str) -> Result<bool> {
    let conn = db.write().await;
    let changed = conn
        .execute(
            "UPDATE sessions SET is_active = 0 WHERE id = ?",
            [session_id],
        )
        .await?;
    Ok(changed > 0)
}

/// Deletes every session whose expiry lies in the past. Returns the number
/// of rows removed.
pub async fn cleanup_expired_sessions(db: &Db) -> Result<u64> {
    let now = now_rfc3339();
    let conn = db.write().await;
    let removed = conn
        .execute("DELETE FROM sessions WHERE expires_at <= ?", [now.as_str()])
        .await?;
    if removed > 0 {
        tracing::debug!(removed, "purged expired sessions");
    }
    Ok(removed)
}
