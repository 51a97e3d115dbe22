use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::services::messaging::MessagingProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub messaging: Box<dyn MessagingProvider>,
}

impl AppState {
    /// Locks the shared connection. Every booking write happens while this
    /// guard is held, which serializes check-then-insert across requests.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
