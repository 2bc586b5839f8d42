//! Sync run reporting and audit types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counts produced by one completed sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub synced_events: usize,
    pub deleted_events: usize,
    pub appointments_pushed: usize,
}

/// Result of invoking the orchestrator for a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Full run: token → fetch → reconcile → push → checkpoint.
    Completed(SyncReport),
    /// No active credential configured; nothing to do.
    NotConnected,
    /// Another run for the same tenant started too recently (cooperative
    /// skip, no blocking lock).
    SkippedRecentRun,
}

/// Append-only audit record, one per engaged orchestrator invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncRunRecord {
    pub id: String,
    pub tenant_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub events_synced: usize,
    pub events_deleted: usize,
    pub appointments_pushed: usize,
    pub error: Option<String>,
    pub requires_reconnect: bool,
}
