//! Scheduler error types

use syncline_domain::SyncError;
use thiserror::Error;

use crate::errors::InfraError;

/// Failures the sync scheduler can surface across its lifecycle.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Start was called while a scheduler instance is active
    #[error("scheduler already running")]
    AlreadyRunning,

    /// Stop was called without a running scheduler
    #[error("scheduler not running")]
    NotRunning,

    /// The configured cron expression was rejected
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    /// The underlying scheduler failed to create, start, or stop
    #[error("scheduler runtime failure: {0}")]
    Runtime(String),

    /// A lifecycle operation exceeded its timeout
    #[error("scheduler {operation} timed out after {seconds}s")]
    Timeout { operation: &'static str, seconds: u64 },

    /// The monitor task could not be joined during shutdown
    #[error("monitor task failed to join: {0}")]
    MonitorJoinFailed(String),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let sync_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                SyncError::InvalidInput(err.to_string())
            }
            SchedulerError::InvalidSchedule { .. } => SyncError::Config(err.to_string()),
            _ => SyncError::Internal(err.to_string()),
        };
        InfraError(sync_err)
    }
}

impl From<SchedulerError> for SyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
