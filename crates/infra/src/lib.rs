//! # Syncline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite implementations of the storage ports
//! - The Google Calendar HTTP client
//! - The cron-based background sync scheduler
//! - Configuration loading (environment variables and files)
//!
//! ## Architecture
//! - Implements traits defined in `syncline-core`
//! - Depends on `syncline-domain` and `syncline-core`
//! - Contains all "impure" code (I/O, HTTP, clocks)

pub mod config;
pub mod database;
pub mod errors;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteAppointmentRepository, SqliteCredentialRepository,
    SqliteEventMirrorRepository, SqliteSyncRunRepository,
};
pub use errors::InfraError;
pub use integrations::google::GoogleCalendarClient;
pub use scheduling::{SchedulerError, SyncScheduler, SyncSchedulerConfig};
