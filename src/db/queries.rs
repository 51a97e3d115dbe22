use chrono::{NaiveDateTime, NaiveTime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::opening_hour::{parse_time, TIME_FORMAT};
use crate::models::{AdminSession, Booking, BookingStatus, Business, Customer, OpeningHour, OtpCode, Service};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn fmt_time(t: &NaiveTime) -> String {
    t.format(TIME_FORMAT).to_string()
}

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, msg.into())
}

fn datetime_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FORMAT)
        .map_err(|e| conversion_error(idx, format!("bad datetime {raw:?}: {e}")))
}

fn time_at(row: &Row, idx: usize) -> rusqlite::Result<NaiveTime> {
    let raw: String = row.get(idx)?;
    parse_time(&raw).map_err(|e| conversion_error(idx, format!("bad time {raw:?}: {e}")))
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> rusqlite::Result<Vec<T>> {
    rows.collect()
}

// ── Businesses ──

fn business_from_row(row: &Row) -> rusqlite::Result<Business> {
    Ok(Business {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

pub fn insert_business(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO businesses (name, description, email, phone) VALUES (?1, ?2, ?3, ?4)",
        params![name, description, email, phone],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_business(conn: &Connection, id: i64) -> rusqlite::Result<Option<Business>> {
    conn.query_row(
        "SELECT id, name, description, email, phone FROM businesses WHERE id = ?1",
        params![id],
        business_from_row,
    )
    .optional()
}

pub fn list_businesses(conn: &Connection) -> rusqlite::Result<Vec<Business>> {
    let mut stmt =
        conn.prepare("SELECT id, name, description, email, phone FROM businesses ORDER BY name ASC, id ASC")?;
    let rows = stmt.query_map([], business_from_row)?;
    collect(rows)
}

pub fn update_business(conn: &Connection, business: &Business) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE businesses SET name = ?1, description = ?2, email = ?3, phone = ?4 WHERE id = ?5",
        params![business.name, business.description, business.email, business.phone, business.id],
    )?;
    Ok(count > 0)
}

pub fn delete_business(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM businesses WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Services ──

const SERVICE_SELECT: &str = "SELECT s.id, s.business_id, b.name, s.name, s.description, s.duration_minutes, s.price_cents, s.is_active
     FROM services s LEFT JOIN businesses b ON b.id = s.business_id";

fn service_from_row(row: &Row) -> rusqlite::Result<Service> {
    Ok(Service {
        id: row.get(0)?,
        business_id: row.get(1)?,
        business_name: row.get(2)?,
        name: row.get(3)?,
        description: row.get(4)?,
        duration_minutes: row.get(5)?,
        price_cents: row.get(6)?,
        is_active: row.get::<_, i32>(7)? != 0,
    })
}

pub fn insert_service(
    conn: &Connection,
    business_id: i64,
    name: &str,
    description: Option<&str>,
    duration_minutes: i64,
    price_cents: i64,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO services (business_id, name, description, duration_minutes, price_cents, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, 1)",
        params![business_id, name, description, duration_minutes, price_cents],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_service(conn: &Connection, id: i64) -> rusqlite::Result<Option<Service>> {
    conn.query_row(&format!("{SERVICE_SELECT} WHERE s.id = ?1"), params![id], service_from_row)
        .optional()
}

pub fn list_services_for_business(conn: &Connection, business_id: i64) -> rusqlite::Result<Vec<Service>> {
    let mut stmt = conn.prepare(&format!(
        "{SERVICE_SELECT} WHERE s.business_id = ?1 ORDER BY s.name ASC, s.id ASC"
    ))?;
    let rows = stmt.query_map(params![business_id], service_from_row)?;
    collect(rows)
}

pub fn update_service(conn: &Connection, service: &Service) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, duration_minutes = ?3, price_cents = ?4, is_active = ?5
         WHERE id = ?6",
        params![
            service.name,
            service.description,
            service.duration_minutes,
            service.price_cents,
            service.is_active as i32,
            service.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Customers ──

fn customer_from_row(row: &Row) -> rusqlite::Result<Customer> {
    Ok(Customer {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
    })
}

pub fn insert_customer(
    conn: &Connection,
    first_name: &str,
    last_name: &str,
    email: Option<&str>,
    phone: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO customers (first_name, last_name, email, phone) VALUES (?1, ?2, ?3, ?4)",
        params![first_name, last_name, email, phone],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_customer(conn: &Connection, id: i64) -> rusqlite::Result<Option<Customer>> {
    conn.query_row(
        "SELECT id, first_name, last_name, email, phone FROM customers WHERE id = ?1",
        params![id],
        customer_from_row,
    )
    .optional()
}

pub fn list_customers(conn: &Connection) -> rusqlite::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, first_name, last_name, email, phone FROM customers
         ORDER BY last_name ASC, first_name ASC, id ASC",
    )?;
    let rows = stmt.query_map([], customer_from_row)?;
    collect(rows)
}

pub fn update_customer(conn: &Connection, customer: &Customer) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE customers SET first_name = ?1, last_name = ?2, email = ?3, phone = ?4 WHERE id = ?5",
        params![customer.first_name, customer.last_name, customer.email, customer.phone, customer.id],
    )?;
    Ok(count > 0)
}

pub fn delete_customer(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM customers WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Opening Hours ──

const OPENING_HOUR_SELECT: &str = "SELECT oh.id, oh.business_id, b.name, oh.day_of_week, oh.start_time, oh.end_time
     FROM opening_hours oh LEFT JOIN businesses b ON b.id = oh.business_id";

fn opening_hour_from_row(row: &Row) -> rusqlite::Result<OpeningHour> {
    Ok(OpeningHour {
        id: row.get(0)?,
        business_id: row.get(1)?,
        business_name: row.get(2)?,
        day_of_week: row.get(3)?,
        start_time: time_at(row, 4)?,
        end_time: time_at(row, 5)?,
    })
}

pub fn insert_opening_hour(
    conn: &Connection,
    business_id: i64,
    day_of_week: u8,
    start: &NaiveTime,
    end: &NaiveTime,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO opening_hours (business_id, day_of_week, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
        params![business_id, day_of_week, fmt_time(start), fmt_time(end)],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_opening_hour(conn: &Connection, id: i64) -> rusqlite::Result<Option<OpeningHour>> {
    conn.query_row(
        &format!("{OPENING_HOUR_SELECT} WHERE oh.id = ?1"),
        params![id],
        opening_hour_from_row,
    )
    .optional()
}

pub fn list_opening_hours_for_business(conn: &Connection, business_id: i64) -> rusqlite::Result<Vec<OpeningHour>> {
    let mut stmt = conn.prepare(&format!(
        "{OPENING_HOUR_SELECT} WHERE oh.business_id = ?1 ORDER BY oh.day_of_week ASC, oh.start_time ASC"
    ))?;
    let rows = stmt.query_map(params![business_id], opening_hour_from_row)?;
    collect(rows)
}

pub fn opening_hours_for_day(
    conn: &Connection,
    business_id: i64,
    day_of_week: u8,
) -> rusqlite::Result<Vec<OpeningHour>> {
    let mut stmt = conn.prepare(&format!(
        "{OPENING_HOUR_SELECT} WHERE oh.business_id = ?1 AND oh.day_of_week = ?2 ORDER BY oh.start_time ASC"
    ))?;
    let rows = stmt.query_map(params![business_id, day_of_week], opening_hour_from_row)?;
    collect(rows)
}

pub fn update_opening_hour(conn: &Connection, oh: &OpeningHour) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE opening_hours SET day_of_week = ?1, start_time = ?2, end_time = ?3 WHERE id = ?4",
        params![oh.day_of_week, fmt_time(&oh.start_time), fmt_time(&oh.end_time), oh.id],
    )?;
    Ok(count > 0)
}

pub fn delete_opening_hour(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM opening_hours WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_SELECT: &str = "SELECT bk.id, bk.business_id, biz.name, bk.service_id, s.name, bk.customer_id,
            c.first_name || ' ' || c.last_name, bk.start_time, bk.end_time, bk.status, bk.created_at, bk.updated_at
     FROM bookings bk
     LEFT JOIN businesses biz ON biz.id = bk.business_id
     LEFT JOIN services s ON s.id = bk.service_id
     LEFT JOIN customers c ON c.id = bk.customer_id";

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(9)?;
    let status = BookingStatus::parse(&status_str)
        .ok_or_else(|| conversion_error(9, format!("unknown booking status {status_str:?}")))?;

    Ok(Booking {
        id: row.get(0)?,
        business_id: row.get(1)?,
        business_name: row.get(2)?,
        service_id: row.get(3)?,
        service_name: row.get(4)?,
        customer_id: row.get(5)?,
        customer_name: row.get(6)?,
        start_time: datetime_at(row, 7)?,
        end_time: datetime_at(row, 8)?,
        status,
        created_at: datetime_at(row, 10)?,
        updated_at: datetime_at(row, 11)?,
    })
}

pub struct NewBookingRow<'a> {
    pub business_id: i64,
    pub service_id: i64,
    pub customer_id: i64,
    pub start_time: &'a NaiveDateTime,
    pub end_time: &'a NaiveDateTime,
    pub status: BookingStatus,
    pub created_at: &'a NaiveDateTime,
}

pub fn insert_booking(conn: &Connection, row: &NewBookingRow) -> rusqlite::Result<i64> {
    let created_at = fmt_datetime(row.created_at);
    conn.execute(
        "INSERT INTO bookings (business_id, service_id, customer_id, start_time, end_time, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
        params![
            row.business_id,
            row.service_id,
            row.customer_id,
            fmt_datetime(row.start_time),
            fmt_datetime(row.end_time),
            row.status.as_str(),
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_booking(conn: &Connection, id: i64) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(&format!("{BOOKING_SELECT} WHERE bk.id = ?1"), params![id], booking_from_row)
        .optional()
}

/// Active bookings of a business whose range intersects `[start, end)`.
/// Served by the `(business_id, start_time)` index.
pub fn active_bookings_in_window(
    conn: &Connection,
    business_id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT}
         WHERE bk.business_id = ?1
           AND bk.status IN ('pending', 'confirmed')
           AND bk.start_time < ?3
           AND bk.end_time > ?2
         ORDER BY bk.start_time ASC"
    ))?;
    let rows = stmt.query_map(
        params![business_id, fmt_datetime(start), fmt_datetime(end)],
        booking_from_row,
    )?;
    collect(rows)
}

pub fn list_bookings_for_business(conn: &Connection, business_id: i64) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT} WHERE bk.business_id = ?1 ORDER BY bk.start_time ASC"
    ))?;
    let rows = stmt.query_map(params![business_id], booking_from_row)?;
    collect(rows)
}

pub fn list_bookings_for_customer(conn: &Connection, customer_id: i64) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "{BOOKING_SELECT} WHERE bk.customer_id = ?1 ORDER BY bk.start_time ASC"
    ))?;
    let rows = stmt.query_map(params![customer_id], booking_from_row)?;
    collect(rows)
}

pub fn list_all_bookings(
    conn: &Connection,
    status_filter: Option<BookingStatus>,
    limit: i64,
) -> rusqlite::Result<Vec<Booking>> {
    match status_filter {
        Some(status) => {
            let mut stmt = conn.prepare(&format!(
                "{BOOKING_SELECT} WHERE bk.status = ?1 ORDER BY bk.start_time DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![status.as_str(), limit], booking_from_row)?;
            collect(rows)
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "{BOOKING_SELECT} ORDER BY bk.start_time DESC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], booking_from_row)?;
            collect(rows)
        }
    }
}

pub fn update_booking(
    conn: &Connection,
    id: i64,
    start: &NaiveDateTime,
    end: &NaiveDateTime,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET start_time = ?1, end_time = ?2, status = ?3, updated_at = ?4 WHERE id = ?5",
        params![fmt_datetime(start), fmt_datetime(end), status.as_str(), fmt_datetime(now), id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    now: &NaiveDateTime,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_datetime(now), id],
    )?;
    Ok(count > 0)
}

pub fn count_bookings_for_business(conn: &Connection, business_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE business_id = ?1",
        params![business_id],
        |row| row.get(0),
    )
}

pub fn count_bookings_for_service(conn: &Connection, service_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE service_id = ?1",
        params![service_id],
        |row| row.get(0),
    )
}

pub fn count_bookings_for_customer(conn: &Connection, customer_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE customer_id = ?1",
        params![customer_id],
        |row| row.get(0),
    )
}

// ── Admin Sessions ──

pub fn insert_session(conn: &Connection, session: &AdminSession) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO admin_sessions (id, created_at, expires_at) VALUES (?1, ?2, ?3)",
        params![session.id, fmt_datetime(&session.created_at), fmt_datetime(&session.expires_at)],
    )?;
    Ok(())
}

pub fn get_live_session(
    conn: &Connection,
    id: &str,
    now: &NaiveDateTime,
) -> rusqlite::Result<Option<AdminSession>> {
    conn.query_row(
        "SELECT id, created_at, expires_at FROM admin_sessions WHERE id = ?1 AND expires_at > ?2",
        params![id, fmt_datetime(now)],
        |row| {
            Ok(AdminSession {
                id: row.get(0)?,
                created_at: datetime_at(row, 1)?,
                expires_at: datetime_at(row, 2)?,
            })
        },
    )
    .optional()
}

pub fn delete_session(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM admin_sessions WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn purge_expired_sessions(conn: &Connection, now: &NaiveDateTime) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM admin_sessions WHERE expires_at <= ?1",
        params![fmt_datetime(now)],
    )
}

// ── OTP Codes ──

pub fn insert_otp(conn: &Connection, phone: &str, code: &str, expires_at: &NaiveDateTime) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO otp_codes (phone, code, expires_at) VALUES (?1, ?2, ?3)",
        params![phone, code, fmt_datetime(expires_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Marks every outstanding code for a phone as used, so only the newest
/// code issued afterwards can verify.
pub fn retire_otps_for_phone(conn: &Connection, phone: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE otp_codes SET used = 1 WHERE phone = ?1 AND used = 0",
        params![phone],
    )
}

pub fn latest_live_otp(conn: &Connection, phone: &str, now: &NaiveDateTime) -> rusqlite::Result<Option<OtpCode>> {
    conn.query_row(
        "SELECT id, phone, code, expires_at, used, attempts FROM otp_codes
         WHERE phone = ?1 AND used = 0 AND expires_at > ?2
         ORDER BY id DESC LIMIT 1",
        params![phone, fmt_datetime(now)],
        |row| {
            Ok(OtpCode {
                id: row.get(0)?,
                phone: row.get(1)?,
                code: row.get(2)?,
                expires_at: datetime_at(row, 3)?,
                used: row.get::<_, i32>(4)? != 0,
                attempts: row.get(5)?,
            })
        },
    )
    .optional()
}

pub fn mark_otp_used(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let count = conn.execute("UPDATE otp_codes SET used = 1 WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn increment_otp_attempts(conn: &Connection, id: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "UPDATE otp_codes SET attempts = attempts + 1 WHERE id = ?1",
        params![id],
    )?;
    conn.query_row("SELECT attempts FROM otp_codes WHERE id = ?1", params![id], |row| row.get(0))
}

pub fn purge_stale_otps(conn: &Connection, now: &NaiveDateTime) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM otp_codes WHERE expires_at <= ?1 OR used = 1",
        params![fmt_datetime(now)],
    )
}

// ── Rate Limits ──

pub fn hour_window(now: &NaiveDateTime) -> String {
    now.format("%Y-%m-%d %H:00:00").to_string()
}

pub fn increment_request_count(conn: &Connection, phone: &str, now: &NaiveDateTime) -> rusqlite::Result<i64> {
    let window = hour_window(now);

    conn.execute(
        "INSERT INTO rate_limits (phone_number, message_count, window_start)
         VALUES (?1, 1, ?2)
         ON CONFLICT(phone_number, window_start) DO UPDATE SET message_count = message_count + 1",
        params![phone, window],
    )?;

    conn.query_row(
        "SELECT message_count FROM rate_limits WHERE phone_number = ?1 AND window_start = ?2",
        params![phone, window],
        |row| row.get(0),
    )
}

pub fn request_count(conn: &Connection, phone: &str, now: &NaiveDateTime) -> rusqlite::Result<i64> {
    let count = conn
        .query_row(
            "SELECT message_count FROM rate_limits WHERE phone_number = ?1 AND window_start = ?2",
            params![phone, hour_window(now)],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.unwrap_or(0))
}

pub fn cleanup_old_windows(conn: &Connection, now: &NaiveDateTime) -> rusqlite::Result<usize> {
    let cutoff = hour_window(&(*now - chrono::Duration::hours(2)));
    conn.execute(
        "DELETE FROM rate_limits WHERE window_start < ?1",
        params![cutoff],
    )
}
