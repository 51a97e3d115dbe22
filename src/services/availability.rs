use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::opening_hour::day_of_week;
use crate::models::Service;
use crate::services::opening_hours::is_within_opening_hours;
use crate::services::overlap::overlaps;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityResult {
    Available,
    OutsideHours,
    Conflict,
    UnknownService,
}

/// Outcome of checking one candidate start time for a service.
/// `end_time` is `None` only when the service could not be resolved.
#[derive(Debug, Clone, Serialize)]
pub struct SlotCheck {
    pub result: AvailabilityResult,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
}

impl SlotCheck {
    /// Turns anything but `Available` into the matching error, yielding the
    /// computed end time otherwise.
    pub fn admit(&self, service_id: i64) -> Result<NaiveDateTime, AppError> {
        match (self.result, self.end_time) {
            (AvailabilityResult::Available, Some(end)) => Ok(end),
            (AvailabilityResult::OutsideHours, _) => Err(AppError::OutsideHours),
            (AvailabilityResult::Conflict, _) => Err(conflict()),
            _ => Err(AppError::UnknownService(service_id)),
        }
    }
}

pub(crate) fn conflict() -> AppError {
    AppError::Conflict("that time slot is already booked".to_string())
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Slot {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

pub const MAX_STEP_MINUTES: i64 = 24 * 60;

/// Stored times have whole-second precision, so finer requests are refused
/// instead of being silently truncated.
pub(crate) fn ensure_whole_seconds(field: &str, t: &NaiveDateTime) -> Result<(), AppError> {
    if t.nanosecond() != 0 {
        return Err(AppError::Validation(format!(
            "{field} must be a whole number of seconds"
        )));
    }
    Ok(())
}

fn service_duration(service: &Service) -> Result<Duration, AppError> {
    service.duration().ok_or_else(|| {
        AppError::Validation(format!(
            "service {} has an unusable duration of {} minutes",
            service.id, service.duration_minutes
        ))
    })
}

fn end_after(start: NaiveDateTime, duration: Duration) -> Result<NaiveDateTime, AppError> {
    start
        .checked_add_signed(duration)
        .ok_or_else(|| AppError::Validation("start_time is out of range".to_string()))
}

/// Looks up a service that can be booked at this business: it must exist,
/// be active and belong to the business.
pub fn bookable_service(
    conn: &Connection,
    business_id: i64,
    service_id: i64,
) -> rusqlite::Result<Option<Service>> {
    let service = queries::get_service(conn, service_id)?;
    Ok(service.filter(|s| s.is_active && s.business_id == business_id))
}

fn ensure_business(conn: &Connection, business_id: i64) -> Result<(), AppError> {
    match queries::get_business(conn, business_id)? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("Business {business_id}"))),
    }
}

/// Checks an explicit `[start, end)` range for a business: legal against
/// opening hours and free of active bookings other than `exclude_booking`.
/// Read-only.
pub fn check_range(
    conn: &Connection,
    business_id: i64,
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude_booking: Option<i64>,
) -> Result<AvailabilityResult, AppError> {
    if end <= start {
        return Err(AppError::Validation("EndTime must be after StartTime".to_string()));
    }

    // Opening hours are same-day intervals; a slot may not cross midnight.
    if start.date() != end.date() {
        return Ok(AvailabilityResult::OutsideHours);
    }

    let day = day_of_week(start.date());
    if !is_within_opening_hours(conn, business_id, day, start.time(), end.time())? {
        return Ok(AvailabilityResult::OutsideHours);
    }

    let candidates = queries::active_bookings_in_window(conn, business_id, &start, &end)?;
    let clash = candidates
        .iter()
        .filter(|b| Some(b.id) != exclude_booking)
        .any(|b| overlaps(b.start_time, b.end_time, start, end));

    if clash {
        return Ok(AvailabilityResult::Conflict);
    }
    Ok(AvailabilityResult::Available)
}

/// Resolves the service duration and checks the slot starting at `start`.
/// Read-only, so it serves both pre-flight checks and the guard inside
/// booking creation.
pub fn check_availability(
    conn: &Connection,
    business_id: i64,
    service_id: i64,
    start: NaiveDateTime,
) -> Result<SlotCheck, AppError> {
    ensure_whole_seconds("start_time", &start)?;
    ensure_business(conn, business_id)?;

    let Some(service) = bookable_service(conn, business_id, service_id)? else {
        return Ok(SlotCheck {
            result: AvailabilityResult::UnknownService,
            start_time: start,
            end_time: None,
        });
    };

    let end = end_after(start, service_duration(&service)?)?;
    let result = check_range(conn, business_id, start, end, None)?;

    Ok(SlotCheck {
        result,
        start_time: start,
        end_time: Some(end),
    })
}

/// Every free slot for the service on `date`, stepping through each opening
/// interval `step_minutes` at a time.
pub fn available_slots(
    conn: &Connection,
    business_id: i64,
    service_id: i64,
    date: NaiveDate,
    step_minutes: i64,
) -> Result<Vec<Slot>, AppError> {
    if step_minutes <= 0 {
        return Err(AppError::Validation("step_minutes must be greater than 0".to_string()));
    }
    if step_minutes > MAX_STEP_MINUTES {
        return Err(AppError::Validation(format!(
            "step_minutes cannot exceed {MAX_STEP_MINUTES}"
        )));
    }
    ensure_business(conn, business_id)?;

    let service = bookable_service(conn, business_id, service_id)?
        .ok_or(AppError::UnknownService(service_id))?;
    let duration = service_duration(&service)?;
    let step = Duration::try_minutes(step_minutes)
        .ok_or_else(|| AppError::Validation("step_minutes is out of range".to_string()))?;

    let (Some(day_start), Some(day_end)) = (
        date.and_hms_opt(0, 0, 0),
        date.succ_opt().and_then(|next| next.and_hms_opt(0, 0, 0)),
    ) else {
        return Err(AppError::Validation("date is out of range".to_string()));
    };
    let hours = queries::opening_hours_for_day(conn, business_id, day_of_week(date))?;
    let booked = queries::active_bookings_in_window(conn, business_id, &day_start, &day_end)?;

    let mut slots = Vec::new();
    for oh in &hours {
        let close = date.and_time(oh.end_time);
        let mut start = date.and_time(oh.start_time);
        while let Some(end) = start.checked_add_signed(duration).filter(|end| *end <= close) {
            if !booked
                .iter()
                .any(|b| overlaps(b.start_time, b.end_time, start, end))
            {
                slots.push(Slot {
                    start_time: start,
                    end_time: end,
                });
            }
            match start.checked_add_signed(step) {
                Some(next) => start = next,
                None => break,
            }
        }
    }

    Ok(slots)
}
