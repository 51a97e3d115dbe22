use serde::{Deserialize, Serialize};

/// Longest bookable service; a booking never spans more than one day.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

/// Something a business sells by the slot. `business_name` is filled in by
/// a join when the row is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub business_id: i64,
    pub business_name: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: i64,
    pub price_cents: i64,
    pub is_active: bool,
}

impl Service {
    /// `None` unless the stored duration is within `1..=MAX_DURATION_MINUTES`.
    pub fn duration(&self) -> Option<chrono::Duration> {
        if !(1..=MAX_DURATION_MINUTES).contains(&self.duration_minutes) {
            return None;
        }
        chrono::Duration::try_minutes(self.duration_minutes)
    }
}
