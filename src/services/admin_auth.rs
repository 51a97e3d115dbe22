use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::AdminSession;

pub const SESSION_COOKIE: &str = "AdminSession";

pub fn login(
    conn: &Connection,
    config: &AppConfig,
    username: &str,
    password: &str,
    now: NaiveDateTime,
) -> Result<AdminSession, AppError> {
    if username.trim().is_empty() || password.trim().is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    if username != config.admin_username || password != config.admin_password {
        tracing::warn!(username = %username, "admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let session = AdminSession {
        id: uuid::Uuid::new_v4().to_string(),
        created_at: now,
        expires_at: now + Duration::hours(config.session_ttl_hours),
    };
    queries::insert_session(conn, &session)?;

    tracing::info!(expires_at = %session.expires_at, "admin session opened");
    Ok(session)
}

pub fn validate_session(
    conn: &Connection,
    session_id: &str,
    now: NaiveDateTime,
) -> Result<AdminSession, AppError> {
    if session_id.is_empty() {
        return Err(AppError::Unauthorized);
    }
    queries::get_live_session(conn, session_id, &now)?.ok_or(AppError::Unauthorized)
}

pub fn logout(conn: &Connection, session_id: &str) -> Result<(), AppError> {
    if queries::delete_session(conn, session_id)? {
        tracing::info!("admin session closed");
    }
    Ok(())
}
