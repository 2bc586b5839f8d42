//! Port interfaces for the sync engine

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use syncline_domain::{
    Appointment, Credential, EventMirror, FetchWindow, RemoteEvent, Result, SyncRunRecord,
};

/// Trait for credential storage and the sync checkpoint
#[async_trait]
pub trait CredentialRepository: Send + Sync {
    /// Fetch the tenant's active credential, if any.
    async fn find_active(&self, tenant_id: &str) -> Result<Option<Credential>>;

    /// Persist a freshly-refreshed access token together with its expiry.
    async fn update_access_token(
        &self,
        tenant_id: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Deactivate the credential (refresh token revoked; forces re-auth).
    async fn mark_inactive(&self, tenant_id: &str) -> Result<()>;

    /// Advance the `last_sync_at` checkpoint.
    async fn update_last_sync(&self, tenant_id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Tenants with an active credential, for the background scheduler.
    async fn list_active_tenants(&self) -> Result<Vec<String>>;
}

/// Trait for the local event mirror table
///
/// `(tenant_id, external_event_id)` is unique at the storage boundary; both
/// operations are idempotent per key.
#[async_trait]
pub trait EventMirrorRepository: Send + Sync {
    /// Insert or replace the mirror row keyed by
    /// `(tenant_id, external_event_id)`.
    async fn upsert(&self, mirror: EventMirror) -> Result<()>;

    /// Delete the mirror row if present. Returns true when a row was
    /// actually removed.
    async fn delete(&self, tenant_id: &str, external_event_id: &str) -> Result<bool>;

    /// Look up a single mirror row.
    async fn find(&self, tenant_id: &str, external_event_id: &str)
        -> Result<Option<EventMirror>>;
}

/// Trait for reading appointments and recording push results
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Appointments eligible for pushing: no external event id yet, active
    /// status, starting at or after `not_before`.
    async fn find_unmirrored(
        &self,
        tenant_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Vec<Appointment>>;

    /// Record the provider-assigned event id. Once set, the appointment is
    /// never pushed again.
    async fn set_external_event_id(
        &self,
        appointment_id: &str,
        external_event_id: &str,
    ) -> Result<()>;
}

/// Trait for the append-only sync audit trail
#[async_trait]
pub trait SyncRunRepository: Send + Sync {
    /// Append one run record.
    async fn append(&self, record: &SyncRunRecord) -> Result<()>;

    /// Most recent runs for a tenant, newest first.
    async fn recent_for_tenant(&self, tenant_id: &str, limit: usize)
        -> Result<Vec<SyncRunRecord>>;
}

/// Response from the provider's token endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub expires_in: i64,
}

/// One page of remote events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsPage {
    pub events: Vec<RemoteEvent>,
    pub next_page_token: Option<String>,
}

/// Payload for creating a remote event from a local appointment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub timezone: String,
}

/// Provider response to an event create
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub external_id: String,
    pub meeting_link: Option<String>,
}

/// Trait for calendar provider operations
///
/// Implementations must bound every call with a timeout and must not retry;
/// the engine fails fast and relies on the next scheduled run.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    /// Exchange a refresh token for a new access token.
    ///
    /// A provider response indicating the refresh token itself is revoked
    /// maps to [`syncline_domain::SyncError::ReauthorizationRequired`];
    /// transient failures map to `ProviderUnavailable`.
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedToken>;

    /// Fetch one page of events within the window, cancelled items included.
    async fn fetch_events_page(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: FetchWindow,
        page_token: Option<&str>,
    ) -> Result<EventsPage>;

    /// Create a remote event and return its provider-assigned id.
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<CreatedEvent>;
}
