//! Booking lifecycle: creation, rescheduling, status transitions and
//! cancellation.
//!
//! Every mutation runs inside a `BEGIN IMMEDIATE` transaction that also
//! performs the availability check, so the write lock is taken before the
//! overlap scan. Together with the process-wide connection mutex this makes
//! concurrent creates for one business linearizable: at most one of several
//! overlapping requests commits and the rest observe `Conflict`.

use chrono::{NaiveDateTime, Utc};
use rusqlite::{Connection, TransactionBehavior};

use crate::db::queries::{self, NewBookingRow};
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus};
use crate::services::availability::{self, AvailabilityResult};

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub business_id: i64,
    pub service_id: i64,
    pub customer_id: i64,
    pub start_time: NaiveDateTime,
    pub status: Option<BookingStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingChanges {
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub status: Option<BookingStatus>,
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn load(conn: &Connection, id: i64) -> Result<Booking, AppError> {
    queries::get_booking(conn, id)?.ok_or_else(|| AppError::NotFound(format!("Booking {id}")))
}

fn is_foreign_key_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}

pub fn create_booking(conn: &mut Connection, request: &NewBooking) -> Result<Booking, AppError> {
    let status = match request.status {
        None | Some(BookingStatus::Pending) => BookingStatus::Pending,
        Some(BookingStatus::Confirmed) => BookingStatus::Confirmed,
        Some(other) => {
            return Err(AppError::Validation(format!(
                "a new booking cannot start as {}",
                other.as_str()
            )))
        }
    };

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let check = availability::check_availability(&tx, request.business_id, request.service_id, request.start_time)?;
    let end_time = check.admit(request.service_id)?;

    if queries::get_customer(&tx, request.customer_id)?.is_none() {
        return Err(AppError::NotFound(format!("Customer {}", request.customer_id)));
    }

    let created_at = now();
    let inserted = queries::insert_booking(
        &tx,
        &NewBookingRow {
            business_id: request.business_id,
            service_id: request.service_id,
            customer_id: request.customer_id,
            start_time: &request.start_time,
            end_time: &end_time,
            status,
            created_at: &created_at,
        },
    );

    // Business, service and customer were all just read in this transaction,
    // so a dangling reference here means the stored rows are corrupt.
    let id = match inserted {
        Ok(id) => id,
        Err(e) if is_foreign_key_violation(&e) => {
            tracing::error!(
                business_id = request.business_id,
                service_id = request.service_id,
                error = %e,
                "booking insert violated service/business linkage"
            );
            return Err(AppError::Integrity(format!(
                "service {} is not linked to an existing business",
                request.service_id
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let booking = load(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        business_id = booking.business_id,
        start = %booking.start_time,
        end = %booking.end_time,
        "booking created"
    );
    Ok(booking)
}

pub fn update_booking(conn: &mut Connection, id: i64, changes: &BookingChanges) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = load(&tx, id)?;

    let status = changes.status.unwrap_or(current.status);
    if !current.status.can_transition_to(status) {
        return Err(AppError::InvalidTransition {
            from: current.status,
            to: status,
        });
    }

    let start = changes.start_time.unwrap_or(current.start_time);
    let end = changes.end_time.unwrap_or(current.end_time);
    availability::ensure_whole_seconds("start_time", &start)?;
    availability::ensure_whole_seconds("end_time", &end)?;
    if end <= start {
        return Err(AppError::Validation("EndTime must be after StartTime".to_string()));
    }

    let moved = start != current.start_time || end != current.end_time;
    if moved && status.is_active() {
        match availability::check_range(&tx, current.business_id, start, end, Some(id))? {
            AvailabilityResult::Available => {}
            AvailabilityResult::OutsideHours => return Err(AppError::OutsideHours),
            AvailabilityResult::Conflict => return Err(availability::conflict()),
            AvailabilityResult::UnknownService => return Err(AppError::UnknownService(current.service_id)),
        }
    }

    queries::update_booking(&tx, id, &start, &end, status, &now())?;
    let booking = load(&tx, id)?;
    tx.commit()?;

    tracing::info!(
        booking_id = id,
        from = current.status.as_str(),
        to = status.as_str(),
        moved,
        "booking updated"
    );
    Ok(booking)
}

/// Soft-cancels: the row stays for history and stops holding its range.
/// Cancelling twice returns the booking unchanged.
pub fn cancel_booking(conn: &mut Connection, id: i64) -> Result<Booking, AppError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let current = load(&tx, id)?;

    if current.status == BookingStatus::Cancelled {
        return Ok(current);
    }
    if !current.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::InvalidTransition {
            from: current.status,
            to: BookingStatus::Cancelled,
        });
    }

    queries::update_booking_status(&tx, id, BookingStatus::Cancelled, &now())?;
    let booking = load(&tx, id)?;
    tx.commit()?;

    tracing::info!(booking_id = id, "booking cancelled");
    Ok(booking)
}

pub fn get_booking(conn: &Connection, id: i64) -> Result<Booking, AppError> {
    load(conn, id)
}

pub fn list_for_business(conn: &Connection, business_id: i64) -> Result<Vec<Booking>, AppError> {
    if queries::get_business(conn, business_id)?.is_none() {
        return Err(AppError::NotFound(format!("Business {business_id}")));
    }
    Ok(queries::list_bookings_for_business(conn, business_id)?)
}

pub fn list_for_customer(conn: &Connection, customer_id: i64) -> Result<Vec<Booking>, AppError> {
    if queries::get_customer(conn, customer_id)?.is_none() {
        return Err(AppError::NotFound(format!("Customer {customer_id}")));
    }
    Ok(queries::list_bookings_for_customer(conn, customer_id)?)
}

pub const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 500;

/// Most recent first. `status` is matched case-insensitively.
pub fn list_all(conn: &Connection, status: Option<&str>, limit: Option<i64>) -> Result<Vec<Booking>, AppError> {
    let status = match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            BookingStatus::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown booking status '{raw}'")))?,
        ),
        None => None,
    };
    let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
    Ok(queries::list_all_bookings(conn, status, limit)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    use crate::db;
    use crate::models::opening_hour::parse_time;
    use crate::services::overlap::overlaps;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    struct Fixture {
        conn: Connection,
        business_id: i64,
        service_id: i64,
        customer_id: i64,
    }

    // Mon 09:00-17:00, 30 minute service
    fn setup() -> Fixture {
        let conn = db::init_db(":memory:").unwrap();
        let business_id = queries::insert_business(&conn, "Salon", None, None, None).unwrap();
        let service_id = queries::insert_service(&conn, business_id, "Trim", None, 30, 2500).unwrap();
        let customer_id = queries::insert_customer(&conn, "Ada", "Lovelace", None, None).unwrap();
        queries::insert_opening_hour(
            &conn,
            business_id,
            1,
            &parse_time("09:00").unwrap(),
            &parse_time("17:00").unwrap(),
        )
        .unwrap();
        Fixture {
            conn,
            business_id,
            service_id,
            customer_id,
        }
    }

    fn request(f: &Fixture, start: &str) -> NewBooking {
        NewBooking {
            business_id: f.business_id,
            service_id: f.service_id,
            customer_id: f.customer_id,
            start_time: dt(start),
            status: None,
        }
    }

    fn assert_no_active_overlaps(conn: &Connection, business_id: i64) {
        let bookings = queries::list_bookings_for_business(conn, business_id).unwrap();
        let active: Vec<_> = bookings.iter().filter(|b| b.status.is_active()).collect();
        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                assert!(
                    !overlaps(a.start_time, a.end_time, b.start_time, b.end_time),
                    "bookings {} and {} overlap",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn test_create_computes_end_and_defaults_to_pending() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();

        assert_eq!(booking.end_time, dt("2025-06-16 10:30"));
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.business_name.as_deref(), Some("Salon"));
        assert_eq!(booking.service_name.as_deref(), Some("Trim"));
        assert_eq!(booking.customer_name.as_deref(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_create_may_start_confirmed_but_not_completed() {
        let mut f = setup();
        let mut req = request(&f, "2025-06-16 10:00");
        req.status = Some(BookingStatus::Confirmed);
        assert_eq!(create_booking(&mut f.conn, &req).unwrap().status, BookingStatus::Confirmed);

        let mut req = request(&f, "2025-06-16 11:00");
        req.status = Some(BookingStatus::Completed);
        let err = create_booking(&mut f.conn, &req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_create_rejects_overlap_outside_hours_and_unknown_service() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        create_booking(&mut f.conn, &req).unwrap();

        let req = request(&f, "2025-06-16 10:15");
        assert!(matches!(create_booking(&mut f.conn, &req), Err(AppError::Conflict(_))));

        let req = request(&f, "2025-06-16 17:00");
        assert!(matches!(create_booking(&mut f.conn, &req), Err(AppError::OutsideHours)));

        let mut req = request(&f, "2025-06-16 12:00");
        req.service_id = 999;
        assert!(matches!(create_booking(&mut f.conn, &req), Err(AppError::UnknownService(999))));

        let req = request(&f, "2025-06-16 10:30");
        create_booking(&mut f.conn, &req).unwrap();
        assert_no_active_overlaps(&f.conn, f.business_id);
    }

    #[test]
    fn test_create_rejects_unknown_customer_and_business() {
        let mut f = setup();
        let mut req = request(&f, "2025-06-16 10:00");
        req.customer_id = 999;
        assert!(matches!(create_booking(&mut f.conn, &req), Err(AppError::NotFound(_))));

        let mut req = request(&f, "2025-06-16 10:00");
        req.business_id = 999;
        assert!(matches!(create_booking(&mut f.conn, &req), Err(AppError::NotFound(_))));

        assert!(queries::list_bookings_for_business(&f.conn, f.business_id).unwrap().is_empty());
    }

    #[test]
    fn test_cancel_frees_the_slot() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();

        let cancelled = cancel_booking(&mut f.conn, booking.id).unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        // Row is kept
        let stored = queries::get_booking(&f.conn, booking.id).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);

        let again = create_booking(&mut f.conn, &req).unwrap();
        assert_eq!(again.start_time, booking.start_time);
    }

    #[test]
    fn test_cancel_is_idempotent_but_not_for_completed() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();
        cancel_booking(&mut f.conn, booking.id).unwrap();
        assert_eq!(cancel_booking(&mut f.conn, booking.id).unwrap().status, BookingStatus::Cancelled);

        let req = request(&f, "2025-06-16 11:00");
        let done = create_booking(&mut f.conn, &req).unwrap();
        let confirm = BookingChanges {
            status: Some(BookingStatus::Confirmed),
            ..Default::default()
        };
        update_booking(&mut f.conn, done.id, &confirm).unwrap();
        let complete = BookingChanges {
            status: Some(BookingStatus::Completed),
            ..Default::default()
        };
        update_booking(&mut f.conn, done.id, &complete).unwrap();

        let err = cancel_booking(&mut f.conn, done.id).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cancel_missing_booking() {
        let mut f = setup();
        assert!(matches!(cancel_booking(&mut f.conn, 42), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_update_validates_transitions() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();

        let skip = BookingChanges {
            status: Some(BookingStatus::Completed),
            ..Default::default()
        };
        let err = update_booking(&mut f.conn, booking.id, &skip).unwrap_err();
        assert!(matches!(
            err,
            AppError::InvalidTransition {
                from: BookingStatus::Pending,
                to: BookingStatus::Completed
            }
        ));

        cancel_booking(&mut f.conn, booking.id).unwrap();
        let revive = BookingChanges {
            status: Some(BookingStatus::Pending),
            ..Default::default()
        };
        let err = update_booking(&mut f.conn, booking.id, &revive).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[test]
    fn test_reschedule_checks_other_bookings_only() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let first = create_booking(&mut f.conn, &req).unwrap();
        let req = request(&f, "2025-06-16 11:00");
        let second = create_booking(&mut f.conn, &req).unwrap();

        // Sliding within its own range is fine
        let nudge = BookingChanges {
            start_time: Some(dt("2025-06-16 10:15")),
            end_time: Some(dt("2025-06-16 10:45")),
            status: None,
        };
        let moved = update_booking(&mut f.conn, first.id, &nudge).unwrap();
        assert_eq!(moved.start_time, dt("2025-06-16 10:15"));

        // Moving onto the other booking is a conflict
        let clash = BookingChanges {
            start_time: Some(dt("2025-06-16 10:45")),
            end_time: Some(dt("2025-06-16 11:15")),
            status: None,
        };
        let err = update_booking(&mut f.conn, first.id, &clash).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // Leaving opening hours is rejected
        let late = BookingChanges {
            start_time: Some(dt("2025-06-16 16:45")),
            end_time: Some(dt("2025-06-16 17:15")),
            status: None,
        };
        let err = update_booking(&mut f.conn, second.id, &late).unwrap_err();
        assert!(matches!(err, AppError::OutsideHours));

        assert_no_active_overlaps(&f.conn, f.business_id);
    }

    #[test]
    fn test_update_rejects_inverted_range() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();
        let inverted = BookingChanges {
            start_time: Some(dt("2025-06-16 11:00")),
            end_time: Some(dt("2025-06-16 10:00")),
            status: None,
        };
        let err = update_booking(&mut f.conn, booking.id, &inverted).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_sub_second_times_are_rejected() {
        let mut f = setup();
        let mut req = request(&f, "2025-06-16 10:00");
        req.start_time += chrono::Duration::milliseconds(750);
        let err = create_booking(&mut f.conn, &req).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let req = request(&f, "2025-06-16 10:00");
        let booking = create_booking(&mut f.conn, &req).unwrap();

        // Both instants would land on 11:00:00 once stored
        let blurred = BookingChanges {
            start_time: Some(dt("2025-06-16 11:00") + chrono::Duration::milliseconds(200)),
            end_time: Some(dt("2025-06-16 11:00") + chrono::Duration::milliseconds(700)),
            status: None,
        };
        let err = update_booking(&mut f.conn, booking.id, &blurred).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let unchanged = get_booking(&f.conn, booking.id).unwrap();
        assert_eq!(unchanged.start_time, dt("2025-06-16 10:00"));
        assert_eq!(unchanged.end_time, dt("2025-06-16 10:30"));
    }

    #[test]
    fn test_list_all_filters_by_status() {
        let mut f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let first = create_booking(&mut f.conn, &req).unwrap();
        let req = request(&f, "2025-06-16 11:00");
        create_booking(&mut f.conn, &req).unwrap();
        cancel_booking(&mut f.conn, first.id).unwrap();

        assert_eq!(list_all(&f.conn, None, None).unwrap().len(), 2);
        let cancelled = list_all(&f.conn, Some("Cancelled"), None).unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, first.id);
        assert_eq!(list_all(&f.conn, None, Some(1)).unwrap().len(), 1);
        assert!(matches!(list_all(&f.conn, Some("lost"), None), Err(AppError::Validation(_))));

        assert_eq!(list_for_customer(&f.conn, f.customer_id).unwrap().len(), 2);
        assert!(matches!(list_for_business(&f.conn, 404), Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_concurrent_overlapping_creates_yield_one_winner() {
        let f = setup();
        let req = request(&f, "2025-06-16 10:00");
        let business_id = f.business_id;
        let conn = Arc::new(Mutex::new(f.conn));

        const WORKERS: usize = 8;
        let barrier = Arc::new(Barrier::new(WORKERS));
        let handles: Vec<_> = (0..WORKERS)
            .map(|_| {
                let conn = Arc::clone(&conn);
                let barrier = Arc::clone(&barrier);
                let req = req.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut guard = conn.lock().unwrap();
                    create_booking(&mut guard, &req)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(AppError::Conflict(_))))
            .count();

        assert_eq!(wins, 1);
        assert_eq!(conflicts, WORKERS - 1);

        let guard = conn.lock().unwrap();
        assert_eq!(queries::list_bookings_for_business(&guard, business_id).unwrap().len(), 1);
    }
}
