use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::messaging::otp_message;
use crate::services::otp::{self, Verification};
use crate::state::AppState;

// POST /api/otp/request
#[derive(Deserialize)]
pub struct OtpRequest {
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Serialize)]
pub struct OtpRequestResponse {
    success: bool,
    message: String,
    phone_number: String,
    expires_in_seconds: i64,
    remaining_attempts: i64,
}

pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<OtpRequestResponse>, AppError> {
    // Released before the SMS goes out
    let issued = {
        let conn = state.conn();
        otp::issue_code(&conn, &state.config, &req.phone_number, Utc::now().naive_utc())?
    };

    let body = otp_message(&issued.code, state.config.otp_ttl_seconds);
    if let Err(e) = state.messaging.send_message(&issued.phone, &body).await {
        tracing::error!(
            provider = state.messaging.name(),
            phone = %issued.phone,
            error = %e,
            "failed to send otp"
        );
        return Err(AppError::Messaging("Failed to send OTP".to_string()));
    }

    Ok(Json(OtpRequestResponse {
        success: true,
        message: "OTP sent successfully".to_string(),
        phone_number: issued.phone,
        expires_in_seconds: state.config.otp_ttl_seconds,
        remaining_attempts: issued.remaining_attempts,
    }))
}

// POST /api/otp/verify
#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyOtpResponse {
    success: bool,
    message: String,
    is_valid: bool,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<(StatusCode, Json<VerifyOtpResponse>), AppError> {
    let outcome = {
        let conn = state.conn();
        otp::verify_code(&conn, &state.config, &req.phone_number, &req.code, Utc::now().naive_utc())?
    };

    let (status, message) = match outcome {
        Verification::Verified => (StatusCode::OK, "OTP verified successfully".to_string()),
        Verification::Mismatch { attempts_left } if attempts_left > 0 => (
            StatusCode::BAD_REQUEST,
            format!("Invalid OTP code. {attempts_left} attempts remaining."),
        ),
        Verification::Mismatch { .. } => (
            StatusCode::BAD_REQUEST,
            "Invalid OTP code. Please request a new code.".to_string(),
        ),
        Verification::NoActiveCode => (
            StatusCode::BAD_REQUEST,
            "No valid OTP found. Please request a new code.".to_string(),
        ),
    };

    let is_valid = outcome == Verification::Verified;
    Ok((
        status,
        Json(VerifyOtpResponse {
            success: is_valid,
            message,
            is_valid,
        }),
    ))
}
