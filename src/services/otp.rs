//! One-time phone verification codes.
//!
//! Requests are limited per phone number per clock hour. Each issued code
//! supersedes earlier ones for the same phone and tolerates a bounded number
//! of wrong guesses before it is burned.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;

pub const CODE_LENGTH: usize = 6;

#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub phone: String,
    pub code: String,
    pub expires_at: NaiveDateTime,
    pub remaining_attempts: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Mismatch { attempts_left: i64 },
    NoActiveCode,
}

/// Optional leading `+`, then at least seven characters drawn from digits,
/// spaces, `-`, `(` and `)`.
pub fn is_valid_phone(phone: &str) -> bool {
    let rest = phone.strip_prefix('+').unwrap_or(phone);
    rest.chars().count() >= 7
        && rest.chars().any(|c| c.is_ascii_digit())
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')'))
}

fn normalized_phone(phone: &str) -> Result<String, AppError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(AppError::Validation("Phone number is required".to_string()));
    }
    if !is_valid_phone(phone) {
        return Err(AppError::Validation("Invalid phone number format".to_string()));
    }
    Ok(phone.to_string())
}

fn generate_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{n:0width$}", width = CODE_LENGTH)
}

pub fn remaining_attempts(
    conn: &Connection,
    config: &AppConfig,
    phone: &str,
    now: &NaiveDateTime,
) -> Result<i64, AppError> {
    let used = queries::request_count(conn, phone.trim(), now)?;
    Ok((config.otp_max_requests_per_hour - used).max(0))
}

/// Stores a fresh code for `phone`. Sending it is left to the caller so the
/// connection is not held across network I/O.
pub fn issue_code(
    conn: &Connection,
    config: &AppConfig,
    phone: &str,
    now: NaiveDateTime,
) -> Result<IssuedCode, AppError> {
    let phone = normalized_phone(phone)?;

    if queries::request_count(conn, &phone, &now)? >= config.otp_max_requests_per_hour {
        tracing::warn!(phone = %phone, "otp request limit reached");
        return Err(AppError::RateLimited(
            "Too many OTP requests. Please try again later.".to_string(),
        ));
    }
    let used = queries::increment_request_count(conn, &phone, &now)?;

    queries::retire_otps_for_phone(conn, &phone)?;
    let code = generate_code();
    let expires_at = now + Duration::seconds(config.otp_ttl_seconds);
    queries::insert_otp(conn, &phone, &code, &expires_at)?;

    tracing::info!(phone = %phone, expires_at = %expires_at, "otp issued");
    Ok(IssuedCode {
        phone,
        code,
        expires_at,
        remaining_attempts: (config.otp_max_requests_per_hour - used).max(0),
    })
}

pub fn verify_code(
    conn: &Connection,
    config: &AppConfig,
    phone: &str,
    code: &str,
    now: NaiveDateTime,
) -> Result<Verification, AppError> {
    let phone = normalized_phone(phone)?;
    let code = code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("Code is required".to_string()));
    }

    let Some(otp) = queries::latest_live_otp(conn, &phone, &now)? else {
        return Ok(Verification::NoActiveCode);
    };

    if otp.attempts >= config.otp_max_verify_attempts {
        queries::mark_otp_used(conn, otp.id)?;
        return Ok(Verification::NoActiveCode);
    }

    if otp.code == code {
        queries::mark_otp_used(conn, otp.id)?;
        tracing::info!(phone = %phone, "otp verified");
        return Ok(Verification::Verified);
    }

    let attempts = queries::increment_otp_attempts(conn, otp.id)?;
    let attempts_left = (config.otp_max_verify_attempts - attempts).max(0);
    if attempts_left == 0 {
        queries::mark_otp_used(conn, otp.id)?;
        tracing::warn!(phone = %phone, "otp burned after too many failed attempts");
    }
    Ok(Verification::Mismatch { attempts_left })
}

/// Drops expired and used codes along with rate-limit windows that can no
/// longer affect a decision.
pub fn cleanup(conn: &Connection, now: &NaiveDateTime) -> rusqlite::Result<usize> {
    let codes = queries::purge_stale_otps(conn, now)?;
    let windows = queries::cleanup_old_windows(conn, now)?;
    Ok(codes + windows)
}
