//! Error types used throughout the sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for Syncline
///
/// Fetch and reconcile failures abort a whole sync run (fail closed); push
/// failures are isolated per appointment (fail open). The orchestrator
/// branches on these variants rather than string-matching messages.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum SyncError {
    /// No active calendar integration is configured for the tenant.
    ///
    /// This is "nothing to do", not a failure: callers should report an
    /// empty sync rather than an error.
    #[error("No calendar credential found for tenant: {0}")]
    CredentialNotFound(String),

    /// The stored refresh token was rejected by the provider.
    ///
    /// Terminal for the integration: the credential has been deactivated and
    /// the tenant must go through authorization again.
    #[error("Calendar reauthorization required for tenant: {0}")]
    ReauthorizationRequired(String),

    /// Network failure or non-2xx response from the provider.
    ///
    /// Not retried within a run; the next scheduled run recovers.
    #[error("Calendar provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A remote record could not be merged into the mirror table.
    #[error("Failed to reconcile remote event '{event_id}': {reason}")]
    ReconciliationConflict { event_id: String, reason: String },

    /// A single appointment failed to push. Logged, never aborts the run.
    #[error("Failed to push appointment: {0}")]
    PushFailure(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Whether the tenant must re-run the authorization flow.
    ///
    /// Surfaced to callers so the UI can show a "reconnect" prompt instead
    /// of a generic sync failure.
    pub fn requires_reconnect(&self) -> bool {
        matches!(self, Self::ReauthorizationRequired(_))
    }
}

/// Result type alias for Syncline operations
pub type Result<T> = std::result::Result<T, SyncError>;
