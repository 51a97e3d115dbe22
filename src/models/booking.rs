use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A reservation of `[start_time, end_time)` at a business. The `*_name`
/// fields are joined in when the row is loaded and are not stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub business_id: i64,
    pub business_name: Option<String>,
    pub service_id: i64,
    pub service_name: Option<String>,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            "completed" => Some(BookingStatus::Completed),
            _ => None,
        }
    }

    /// Active bookings hold their time range against other bookings.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled | BookingStatus::Completed)
    }

    /// Pending -> Confirmed -> Completed, and Pending|Confirmed -> Cancelled.
    /// Staying in the same non-terminal status is allowed.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, Pending | Confirmed | Cancelled) => true,
            (Confirmed, Confirmed | Completed | Cancelled) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::BookingStatus::*;

    #[test]
    fn test_forward_transitions_allowed() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_no_transition_out_of_terminal_states() {
        for next in [Pending, Confirmed, Cancelled, Completed] {
            assert!(!Cancelled.can_transition_to(next), "cancelled -> {next:?}");
            assert!(!Completed.can_transition_to(next), "completed -> {next:?}");
        }
    }

    #[test]
    fn test_cannot_skip_or_go_backwards() {
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Pending));
    }

    #[test]
    fn test_parse_round_trips_and_rejects_unknown() {
        for status in [Pending, Confirmed, Cancelled, Completed] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("Confirmed"), Some(Confirmed));
        assert_eq!(BookingStatus::parse("archived"), None);
    }
}
