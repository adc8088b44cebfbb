use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State, http::StatusCode};
use thiserror::Error;
use time::Duration;
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::database::Db;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{ApiJson, AuthUser};
use crate::models::{AuthResponse, LoginPayload, MessageResponse, PublicUser, RegisterPayload, User};
use crate::sessions::{cleanup_expired_sessions, create_session, deactivate_session, validate_session};
use crate::utils::{flag, now_rfc3339, optional_text};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no active user with that email")]
    UnknownEmail,
    #[error("password does not match")]
    WrongPassword,
}

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// An unparseable stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

/// Finds the active user whose email equals `email` and whose stored hash
/// verifies `password`.
pub fn check_credentials<'a>(
    users: &'a [User],
    email: &str,
    password: &str,
) -> Result<&'a User, AuthError> {
    let user = users
        .iter()
        .find(|u| u.is_active && u.email == email)
        .ok_or(AuthError::UnknownEmail)?;

    if verify_password(password, &user.password_hash) {
        Ok(user)
    } else {
        Err(AuthError::WrongPassword)
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, last_login, is_active";

pub fn extract_user_from_row(row: &libsql::Row) -> anyhow::Result<User> {
    let is_active: i64 = row.get(6)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
        last_login: optional_text(row.get_value(5)?),
        is_active: flag(is_active),
    })
}

pub async fn create_user(db: &Db, name: &str, email: &str, password: &str) -> anyhow::Result<User> {
    let user = User {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        created_at: now_rfc3339(),
        last_login: None,
        is_active: true,
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, created_at, is_active) VALUES (?, ?, ?, ?, ?, 1)",
        (
            user.id.as_str(),
            user.name.as_str(),
            user.email.as_str(),
            user.password_hash.as_str(),
            user.created_at.as_str(),
        ),
    )
    .await?;

    Ok(user)
}

pub async fn get_user_by_email(db: &Db, email: &str) -> anyhow::Result<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
            [email],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn get_user_by_id(db: &Db, user_id: &str) -> anyhow::Result<Option<User>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
            [user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_user_from_row(&row)?)),
        None => Ok(None),
    }
}

pub async fn update_last_login(db: &Db, user_id: &str) -> anyhow::Result<String> {
    let now = now_rfc3339();
    let conn = db.write().await;
    conn.execute(
        "UPDATE users SET last_login = ? WHERE id = ?",
        (now.as_str(), user_id),
    )
    .await?;
    Ok(now)
}

/// Records a server-side session for `user` and binds it to the cookie.
async fn start_session(state: &AppState, session: &Session, user: &User) -> ApiResult<()> {
    let record = create_session(
        &state.db,
        &user.id,
        Duration::hours(state.session_expiry_hours),
    )
    .await?;

    session.cycle_id().await?;
    session.insert(SESSION_KEY_ID, &record.id).await?;
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<RegisterPayload>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    // Email format and password strength are not checked.
    if payload.name.is_empty() || payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(ERR_REGISTER_FIELDS));
    }

    if get_user_by_email(&state.db, &payload.email).await?.is_some() {
        tracing::warn!(email = %payload.email, "registration for existing email");
        return Err(ApiError::bad_request(ERR_USER_EXISTS));
    }

    let user = create_user(&state.db, &payload.name, &payload.email, &payload.password)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                ApiError::bad_request(ERR_USER_EXISTS)
            } else {
                ApiError::Internal(e)
            }
        })?;

    start_session(&state, &session, &user).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User created successfully".to_string(),
            user: PublicUser::from(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> ApiResult<Json<AuthResponse>> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::bad_request(ERR_LOGIN_FIELDS));
    }

    let candidates: Vec<User> = get_user_by_email(&state.db, &payload.email)
        .await?
        .into_iter()
        .collect();

    let user = match check_credentials(&candidates, &payload.email, &payload.password) {
        Ok(user) => user,
        Err(reason) => {
            tracing::warn!(email = %payload.email, %reason, "login rejected");
            return Err(ApiError::unauthorized(ERR_INVALID_CREDENTIALS));
        }
    };

    update_last_login(&state.db, &user.id).await?;
    cleanup_expired_sessions(&state.db).await?;
    start_session(&state, &session, user).await?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: PublicUser::from(user),
    }))
}

/// Resolves the cookie session to its user, or 401.
pub async fn get_current_user(state: &AppState, session: &Session) -> ApiResult<User> {
    let session_id: Option<String> = session.get(SESSION_KEY_ID).await?;
    let Some(session_id) = session_id else {
        return Err(ApiError::unauthorized(ERR_AUTH_REQUIRED));
    };

    match validate_session(&state.db, &session_id).await? {
        Some((_, user)) => Ok(user),
        None => Err(ApiError::unauthorized(ERR_AUTH_REQUIRED)),
    }
}

pub async fn me(AuthUser(user): AuthUser) -> ApiResult<Json<PublicUser>> {
    Ok(Json(PublicUser::from(&user)))
}

pub async fn logout(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<MessageResponse>> {
    let session_id: Option<String> = session.get(SESSION_KEY_ID).await?;
    if let Some(session_id) = session_id {
        deactivate_session(&state.db, &session_id).await?;
        tracing::info!(%session_id, "session closed");
    }
    session.flush().await?;

    Ok(Json(MessageResponse::ok("Logged out successfully")))
}
