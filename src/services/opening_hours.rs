use chrono::NaiveTime;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::opening_hour::hhmm;
use crate::models::OpeningHour;
use crate::services::overlap::overlaps;

/// True iff `[start, end)` fits inside at least one opening interval of the
/// business on that weekday. A range spanning a closing gap between split
/// shifts is rejected.
pub fn is_within_opening_hours(
    conn: &Connection,
    business_id: i64,
    day_of_week: u8,
    start: NaiveTime,
    end: NaiveTime,
) -> rusqlite::Result<bool> {
    let hours = queries::opening_hours_for_day(conn, business_id, day_of_week)?;
    Ok(hours.iter().any(|oh| oh.contains(start, end)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpeningHourInput {
    pub day_of_week: i64,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
}

fn validate_input(input: &OpeningHourInput) -> Result<u8, AppError> {
    if !(0..=6).contains(&input.day_of_week) {
        return Err(AppError::Validation(
            "DayOfWeek must be between 0 (Sunday) and 6 (Saturday)".to_string(),
        ));
    }
    if input.end_time <= input.start_time {
        return Err(AppError::Validation("EndTime must be after StartTime".to_string()));
    }
    Ok(input.day_of_week as u8)
}

/// Split shifts on the same day must not overlap each other.
fn ensure_no_sibling_overlap(
    conn: &Connection,
    business_id: i64,
    day_of_week: u8,
    start: NaiveTime,
    end: NaiveTime,
    exclude_id: Option<i64>,
) -> Result<(), AppError> {
    let siblings = queries::opening_hours_for_day(conn, business_id, day_of_week)?;
    let clash = siblings
        .iter()
        .filter(|oh| Some(oh.id) != exclude_id)
        .find(|oh| overlaps(oh.start_time, oh.end_time, start, end));

    match clash {
        Some(oh) => Err(AppError::Conflict(format!(
            "overlaps existing opening hours {}-{}",
            oh.start_time.format("%H:%M"),
            oh.end_time.format("%H:%M")
        ))),
        None => Ok(()),
    }
}

pub fn create_opening_hour(
    conn: &Connection,
    business_id: i64,
    input: &OpeningHourInput,
) -> Result<OpeningHour, AppError> {
    let day = validate_input(input)?;

    if queries::get_business(conn, business_id)?.is_none() {
        return Err(AppError::NotFound(format!("Business {business_id}")));
    }
    ensure_no_sibling_overlap(conn, business_id, day, input.start_time, input.end_time, None)?;

    let id = queries::insert_opening_hour(conn, business_id, day, &input.start_time, &input.end_time)?;
    tracing::info!(opening_hour_id = id, business_id, day, "opening hour created");

    queries::get_opening_hour(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Opening hour {id}")))
}

pub fn update_opening_hour(
    conn: &Connection,
    id: i64,
    input: &OpeningHourInput,
) -> Result<OpeningHour, AppError> {
    let mut existing = queries::get_opening_hour(conn, id)?
        .ok_or_else(|| AppError::NotFound(format!("Opening hour {id}")))?;
    let day = validate_input(input)?;

    ensure_no_sibling_overlap(conn, existing.business_id, day, input.start_time, input.end_time, Some(id))?;

    existing.day_of_week = day;
    existing.start_time = input.start_time;
    existing.end_time = input.end_time;
    queries::update_opening_hour(conn, &existing)?;

    Ok(existing)
}

pub fn get_opening_hour(conn: &Connection, id: i64) -> Result<OpeningHour, AppError> {
    queries::get_opening_hour(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Opening hour {id}")))
}

pub fn list_for_business(conn: &Connection, business_id: i64) -> Result<Vec<OpeningHour>, AppError> {
    if queries::get_business(conn, business_id)?.is_none() {
        return Err(AppError::NotFound(format!("Business {business_id}")));
    }
    Ok(queries::list_opening_hours_for_business(conn, business_id)?)
}

/// Existing bookings are left alone even if they no longer fall inside
/// the remaining hours.
pub fn delete_opening_hour(conn: &Connection, id: i64) -> Result<(), AppError> {
    if !queries::delete_opening_hour(conn, id)? {
        return Err(AppError::NotFound(format!("Opening hour {id}")));
    }
    tracing::info!(opening_hour_id = id, "opening hour deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::opening_hour::parse_time;

    fn t(s: &str) -> NaiveTime {
        parse_time(s).unwrap()
    }

    fn setup() -> (Connection, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let business_id = queries::insert_business(&conn, "Barber", None, None, None).unwrap();
        (conn, business_id)
    }

    fn input(day: i64, start: &str, end: &str) -> OpeningHourInput {
        OpeningHourInput {
            day_of_week: day,
            start_time: t(start),
            end_time: t(end),
        }
    }

    #[test]
    fn test_within_single_interval() {
        let (conn, biz) = setup();
        create_opening_hour(&conn, biz, &input(1, "09:00", "17:00")).unwrap();

        assert!(is_within_opening_hours(&conn, biz, 1, t("09:00"), t("09:30")).unwrap());
        assert!(is_within_opening_hours(&conn, biz, 1, t("16:30"), t("17:00")).unwrap());
        assert!(!is_within_opening_hours(&conn, biz, 1, t("17:00"), t("17:30")).unwrap());
        assert!(!is_within_opening_hours(&conn, biz, 2, t("10:00"), t("10:30")).unwrap());
    }

    #[test]
    fn test_range_spanning_lunch_gap_is_rejected() {
        let (conn, biz) = setup();
        create_opening_hour(&conn, biz, &input(3, "09:00", "12:00")).unwrap();
        create_opening_hour(&conn, biz, &input(3, "13:00", "17:00")).unwrap();

        assert!(is_within_opening_hours(&conn, biz, 3, t("11:30"), t("12:00")).unwrap());
        assert!(is_within_opening_hours(&conn, biz, 3, t("13:00"), t("13:30")).unwrap());
        assert!(!is_within_opening_hours(&conn, biz, 3, t("11:30"), t("13:30")).unwrap());
        assert!(!is_within_opening_hours(&conn, biz, 3, t("12:15"), t("12:45")).unwrap());
    }

    #[test]
    fn test_no_hours_means_closed() {
        let (conn, biz) = setup();
        assert!(!is_within_opening_hours(&conn, biz, 1, t("10:00"), t("10:30")).unwrap());
    }

    #[test]
    fn test_rejects_bad_day_and_inverted_range() {
        let (conn, biz) = setup();
        let err = create_opening_hour(&conn, biz, &input(7, "09:00", "17:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_opening_hour(&conn, biz, &input(1, "17:00", "09:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = create_opening_hour(&conn, biz, &input(1, "09:00", "09:00")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_business() {
        let (conn, _) = setup();
        let err = create_opening_hour(&conn, 999, &input(1, "09:00", "17:00")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_overlapping_split_shift_rejected() {
        let (conn, biz) = setup();
        create_opening_hour(&conn, biz, &input(1, "09:00", "12:00")).unwrap();

        let err = create_opening_hour(&conn, biz, &input(1, "11:00", "14:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Adjacent shifts are fine, as is the same range on another day
        create_opening_hour(&conn, biz, &input(1, "12:00", "14:00")).unwrap();
        create_opening_hour(&conn, biz, &input(2, "11:00", "14:00")).unwrap();
    }

    #[test]
    fn test_update_ignores_its_own_row() {
        let (conn, biz) = setup();
        let oh = create_opening_hour(&conn, biz, &input(1, "09:00", "12:00")).unwrap();
        let other = create_opening_hour(&conn, biz, &input(1, "13:00", "17:00")).unwrap();

        let updated = update_opening_hour(&conn, oh.id, &input(1, "08:00", "12:30")).unwrap();
        assert_eq!(updated.start_time, t("08:00"));
        assert_eq!(updated.end_time, t("12:30"));

        let err = update_opening_hour(&conn, other.id, &input(1, "12:00", "17:00")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
