use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

pub const TIME_FORMAT: &str = "%H:%M";

/// One open interval of a business on a weekday. `day_of_week` counts from
/// Sunday: 0 = Sunday .. 6 = Saturday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpeningHour {
    pub id: i64,
    pub business_id: i64,
    pub business_name: Option<String>,
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

impl OpeningHour {
    /// True if `[start, end)` lies entirely inside this interval.
    pub fn contains(&self, start: NaiveTime, end: NaiveTime) -> bool {
        crate::services::overlap::contains(self.start_time, self.end_time, start, end)
    }
}

pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn parse_time(s: &str) -> Result<NaiveTime, chrono::ParseError> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
}

/// Serde adapter for "HH:MM" times of day. Also accepts "HH:MM:SS".
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(super::TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::parse_time(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn hours(start: &str, end: &str) -> OpeningHour {
        OpeningHour {
            id: 1,
            business_id: 1,
            business_name: None,
            day_of_week: 1,
            start_time: t(start),
            end_time: t(end),
        }
    }

    #[test]
    fn test_day_of_week_counts_from_sunday() {
        // 2025-06-15 is a Sunday, 2025-06-16 a Monday, 2025-06-21 a Saturday
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()), 0);
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()), 1);
        assert_eq!(day_of_week(NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()), 6);
    }

    #[test]
    fn test_contains_is_inclusive_of_both_edges() {
        let oh = hours("09:00", "17:00");
        assert!(oh.contains(t("09:00"), t("17:00")));
        assert!(oh.contains(t("16:30"), t("17:00")));
        assert!(!oh.contains(t("16:45"), t("17:15")));
        assert!(!oh.contains(t("08:45"), t("09:15")));
    }

    #[test]
    fn test_parse_time_accepts_seconds() {
        assert_eq!(t("09:30"), t("09:30:00"));
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("nine").is_err());
    }

    #[test]
    fn test_serializes_as_hhmm() {
        let json = serde_json::to_value(hours("09:00", "17:30")).unwrap();
        assert_eq!(json["start_time"], "09:00");
        assert_eq!(json["end_time"], "17:30");
    }
}
