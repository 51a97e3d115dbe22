use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_username: String,
    pub admin_password: String,
    pub session_ttl_hours: i64,
    pub otp_ttl_seconds: i64,
    pub otp_max_requests_per_hour: i64,
    pub otp_max_verify_attempts: i64,
    pub slot_step_minutes: i64,
    pub sweep_interval_secs: u64,
    pub cors_allowed_origin: Option<String>,
    pub twilio_account_sid: String,
    pub twilio_auth_token: String,
    pub twilio_phone_number: String,
}

/// Upper bounds keep expiry arithmetic on a `NaiveDateTime` in range.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;
const MAX_OTP_TTL_SECONDS: i64 = 24 * 3600;

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: "bookwell.db".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "changeme".to_string(),
            session_ttl_hours: 8,
            otp_ttl_seconds: 300,
            otp_max_requests_per_hour: 3,
            otp_max_verify_attempts: 5,
            slot_step_minutes: 15,
            sweep_interval_secs: 60,
            cors_allowed_origin: None,
            twilio_account_sid: String::new(),
            twilio_auth_token: String::new(),
            twilio_phone_number: String::new(),
        }
    }
}

impl AppConfig {
    /// Every setting falls back to `AppConfig::default()` when its variable
    /// is unset or does not parse.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed("PORT", defaults.port),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or(defaults.admin_username),
            admin_password: env::var("ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            session_ttl_hours: parsed("SESSION_TTL_HOURS", defaults.session_ttl_hours)
                .clamp(1, MAX_SESSION_TTL_HOURS),
            otp_ttl_seconds: parsed("OTP_TTL_SECONDS", defaults.otp_ttl_seconds).clamp(1, MAX_OTP_TTL_SECONDS),
            otp_max_requests_per_hour: parsed("OTP_MAX_REQUESTS_PER_HOUR", defaults.otp_max_requests_per_hour),
            otp_max_verify_attempts: parsed("OTP_MAX_VERIFY_ATTEMPTS", defaults.otp_max_verify_attempts),
            slot_step_minutes: parsed("SLOT_STEP_MINUTES", defaults.slot_step_minutes),
            sweep_interval_secs: parsed("SWEEP_INTERVAL_SECS", defaults.sweep_interval_secs),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN").ok().filter(|v| !v.is_empty()),
            twilio_account_sid: env::var("TWILIO_ACCOUNT_SID").unwrap_or(defaults.twilio_account_sid),
            twilio_auth_token: env::var("TWILIO_AUTH_TOKEN").unwrap_or(defaults.twilio_auth_token),
            twilio_phone_number: env::var("TWILIO_PHONE_NUMBER").unwrap_or(defaults.twilio_phone_number),
        }
    }

    pub fn twilio_configured(&self) -> bool {
        !self.twilio_account_sid.is_empty()
            && !self.twilio_auth_token.is_empty()
            && !self.twilio_phone_number.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, "bookwell.db");
        assert_eq!(config.otp_max_requests_per_hour, 3);
        assert_eq!(config.slot_step_minutes, 15);
        assert!(config.cors_allowed_origin.is_none());
        assert!(!config.twilio_configured());
    }

    #[test]
    fn test_twilio_needs_every_credential() {
        let mut config = AppConfig {
            twilio_account_sid: "AC123".to_string(),
            twilio_auth_token: "token".to_string(),
            ..AppConfig::default()
        };
        assert!(!config.twilio_configured());

        config.twilio_phone_number = "+15550000000".to_string();
        assert!(config.twilio_configured());
    }
}
