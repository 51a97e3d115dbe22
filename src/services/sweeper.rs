use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::db::queries;
use crate::services::otp;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub otp_rows: usize,
}

pub fn sweep_once(conn: &Connection, now: &NaiveDateTime) -> rusqlite::Result<SweepReport> {
    Ok(SweepReport {
        sessions: queries::purge_expired_sessions(conn, now)?,
        otp_rows: otp::cleanup(conn, now)?,
    })
}

/// Background task that periodically purges expired sessions, spent codes
/// and old rate-limit windows.
pub async fn run_sweeper(db: Arc<Mutex<Connection>>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let now = Utc::now().naive_utc();
        let result = {
            let conn = db.lock().unwrap_or_else(PoisonError::into_inner);
            sweep_once(&conn, &now)
        };
        match result {
            Ok(report) if report != SweepReport::default() => {
                tracing::info!(sessions = report.sessions, otp_rows = report.otp_rows, "sweep removed stale rows");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "sweep failed"),
        }
    }
}
