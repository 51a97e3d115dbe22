use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSession {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub expires_at: NaiveDateTime,
}

impl AdminSession {
    pub fn is_expired(&self, now: &NaiveDateTime) -> bool {
        self.expires_at <= *now
    }
}
