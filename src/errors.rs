use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rusqlite::ErrorCode;

use crate::models::BookingStatus;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("the requested time is outside opening hours")]
    OutsideHours,

    #[error("service {0} is not offered by this business")]
    UnknownService(i64),

    #[error("{0}")]
    Conflict(String),

    #[error("cannot change a {} booking to {}", .from.as_str(), .to.as_str())]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("the booking could not be committed, please retry")]
    Concurrency,

    #[error("unauthorized")]
    Unauthorized,

    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("referential integrity violated: {0}")]
    Integrity(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::InvalidTransition { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::OutsideHours => "OUTSIDE_HOURS",
            AppError::UnknownService(_) => "UNKNOWN_SERVICE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Concurrency => "CONCURRENCY_ERROR",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::RateLimited(_) => "RATE_LIMITED",
            AppError::Messaging(_) => "MESSAGING_ERROR",
            AppError::Integrity(_) => "INTEGRITY_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            AppError::OutsideHours => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnknownService(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Concurrency => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Messaging(_) => StatusCode::BAD_GATEWAY,
            AppError::Integrity(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// A busy or locked database means another writer won the race; callers retry.
impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _)
                if matches!(err.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                AppError::Concurrency
            }
            _ => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        }

        let body = serde_json::json!({
            "success": false,
            "message": self.to_string(),
            "error_code": self.code(),
        });
        (status, axum::Json(body)).into_response()
    }
}
