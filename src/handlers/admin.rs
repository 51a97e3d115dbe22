use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::AdminSession;
use crate::services::admin_auth::{self, SESSION_COOKIE};
use crate::state::AppState;

/// Session id from the `AdminSession` cookie, or from an
/// `Authorization: Bearer` header for non-browser clients.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    let from_cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string());

    from_cookie.or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

pub fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<AdminSession, AppError> {
    let id = session_id(headers).ok_or(AppError::Unauthorized)?;
    let conn = state.conn();
    admin_auth::validate_session(&conn, &id, Utc::now().naive_utc())
}

fn session_cookie(id: &str, max_age_secs: i64) -> String {
    format!("{SESSION_COOKIE}={id}; Path=/; Max-Age={max_age_secs}; HttpOnly; Secure; SameSite=Strict")
}

// POST /api/admin/login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    success: bool,
    message: String,
    session_id: String,
    expires_at: NaiveDateTime,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = {
        let conn = state.conn();
        admin_auth::login(&conn, &state.config, &req.username, &req.password, Utc::now().naive_utc())?
    };

    let cookie = session_cookie(&session.id, state.config.session_ttl_hours * 3600);
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            session_id: session.id,
            expires_at: session.expires_at,
        }),
    ))
}

// GET /api/admin/validate-session
#[derive(Serialize)]
pub struct SessionStatus {
    valid: bool,
    message: String,
    expires_at: NaiveDateTime,
}

pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SessionStatus>, AppError> {
    let session = require_admin(&state, &headers)?;
    Ok(Json(SessionStatus {
        valid: true,
        message: "Session is active".to_string(),
        expires_at: session.expires_at,
    }))
}

// POST /api/admin/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(id) = session_id(&headers) {
        let conn = state.conn();
        admin_auth::logout(&conn, &id)?;
    }

    Ok((
        AppendHeaders([(SET_COOKIE, session_cookie("", 0))]),
        Json(serde_json::json!({"success": true, "message": "Logout successful"})),
    ))
}
