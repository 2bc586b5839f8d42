//! Calendar credential and event types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Stored OAuth credential for a tenant's calendar integration.
///
/// At most one active credential exists per tenant. `token_expires_at`
/// always reflects the access token currently stored; the token lifecycle
/// manager persists both together on every refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub tenant_id: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_expires_at: DateTime<Utc>,
    /// Calendar the provider selected as the tenant's default during
    /// authorization.
    pub default_calendar_id: String,
    pub is_active: bool,
    /// Checkpoint: when the last fully-successful sync run completed.
    pub last_sync_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Whether the stored access token is still usable at `now`, keeping a
    /// safety margin so a token does not expire mid-request.
    pub fn token_valid_at(&self, now: DateTime<Utc>, margin_secs: i64) -> bool {
        self.token_expires_at > now + Duration::seconds(margin_secs)
    }
}

/// Lifecycle status reported by the provider for a remote event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteEventStatus {
    Confirmed,
    Cancelled,
}

/// Normalized event record returned by the remote event fetcher.
///
/// Cancelled events are included (the provider hides them unless asked) so
/// the reconciliation engine can observe deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEvent {
    /// Provider-assigned id; the idempotency key for the mirror table.
    pub external_id: String,
    pub status: RemoteEventStatus,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    /// For all-day events this is the provider's exclusive end date,
    /// preserved as-is; any off-by-one correction belongs to the renderer.
    pub end_at: DateTime<Utc>,
    pub is_all_day: bool,
    pub timezone: Option<String>,
    /// Provider version token, used to detect content changes downstream.
    pub etag: Option<String>,
    pub meeting_link: Option<String>,
    pub attendees: Vec<String>,
    pub recurrence_rule: Option<String>,
    pub recurring_event_id: Option<String>,
}

/// Local cached copy of a remote event. The provider is authoritative;
/// mirror rows are replaced wholesale on every reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMirror {
    pub tenant_id: String,
    pub external_event_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_all_day: bool,
    pub timezone: Option<String>,
    pub etag: Option<String>,
    pub meeting_link: Option<String>,
    pub attendees: Vec<String>,
    pub recurrence_rule: Option<String>,
    pub recurring_event_id: Option<String>,
    pub last_synced_at: DateTime<Utc>,
}

impl EventMirror {
    /// Build a mirror row from a fetched remote event.
    pub fn from_remote(tenant_id: &str, event: &RemoteEvent, synced_at: DateTime<Utc>) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            external_event_id: event.external_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            location: event.location.clone(),
            start_at: event.start_at,
            end_at: event.end_at,
            is_all_day: event.is_all_day,
            timezone: event.timezone.clone(),
            etag: event.etag.clone(),
            meeting_link: event.meeting_link.clone(),
            attendees: event.attendees.clone(),
            recurrence_rule: event.recurrence_rule.clone(),
            recurring_event_id: event.recurring_event_id.clone(),
            last_synced_at: synced_at,
        }
    }
}

/// Bounded time window for an incremental fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// Window around `now`: `lookback_hours` into the past (recently-past
    /// edits) and `lookahead_hours` forward (future bookings).
    pub fn around(now: DateTime<Utc>, lookback_hours: i64, lookahead_hours: i64) -> Self {
        Self {
            start: now - Duration::hours(lookback_hours),
            end: now + Duration::hours(lookahead_hours),
        }
    }
}
