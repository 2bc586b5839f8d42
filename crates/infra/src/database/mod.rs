//! SQLite persistence layer

pub mod appointment_repository;
pub mod credential_repository;
pub mod event_mirror_repository;
pub mod manager;
pub mod sync_run_repository;

pub use appointment_repository::SqliteAppointmentRepository;
pub use credential_repository::SqliteCredentialRepository;
pub use event_mirror_repository::SqliteEventMirrorRepository;
pub use manager::DbManager;
pub use sync_run_repository::SqliteSyncRunRepository;

use chrono::{DateTime, Utc};
use syncline_domain::{Result, SyncError};

/// Unix-second representation used for every stored timestamp.
pub(crate) fn to_ts(at: DateTime<Utc>) -> i64 {
    at.timestamp()
}

pub(crate) fn from_ts(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| SyncError::Database(format!("timestamp out of range: {ts}")))
}
