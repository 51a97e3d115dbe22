use chrono::NaiveDateTime;

/// A single-use verification code. Never serialized to clients.
#[derive(Debug, Clone)]
pub struct OtpCode {
    pub id: i64,
    pub phone: String,
    pub code: String,
    pub expires_at: NaiveDateTime,
    pub used: bool,
    pub attempts: i64,
}
