//! Google Calendar HTTP client
//!
//! Implements the `CalendarProvider` port against the Google Calendar v3
//! API. Every request carries the configured timeout and is never retried;
//! the engine fails fast and relies on the next scheduled run.
//!
//! Base URLs come from configuration so tests can point the client at a
//! local mock server.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use syncline_core::{CalendarProvider, CreatedEvent, EventDraft, EventsPage, RefreshedToken};
use syncline_domain::{
    FetchWindow, GoogleApiConfig, RemoteEvent, RemoteEventStatus, Result, SyncConfig, SyncError,
};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// Google Calendar provider client.
pub struct GoogleCalendarClient {
    http: Client,
    config: GoogleApiConfig,
    max_results: u32,
}

impl GoogleCalendarClient {
    pub fn new(config: GoogleApiConfig, sync: &SyncConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(sync.http_timeout_secs))
            .build()
            .map_err(InfraError::from)?;

        Ok(Self { http, config, max_results: sync.max_results })
    }

    fn events_url(&self, calendar_id: &str) -> String {
        format!("{}/calendars/{}/events", self.config.api_base_url, calendar_id)
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarClient {
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<RefreshedToken> {
        let response = self
            .http
            .post(&self.config.token_url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            // An invalid_grant response means the refresh token itself was
            // revoked or expired; anything else is treated as transient.
            if status.is_client_error() && body.contains("invalid_grant") {
                return Err(SyncError::ReauthorizationRequired(
                    "refresh token rejected by provider".into(),
                ));
            }
            return Err(SyncError::ProviderUnavailable(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token: GoogleTokenResponse = response.json().await.map_err(|e| {
            SyncError::ProviderUnavailable(format!("failed to parse token response: {e}"))
        })?;

        Ok(RefreshedToken { access_token: token.access_token, expires_in: token.expires_in })
    }

    async fn fetch_events_page(
        &self,
        access_token: &str,
        calendar_id: &str,
        window: FetchWindow,
        page_token: Option<&str>,
    ) -> Result<EventsPage> {
        let max_results = self.max_results.to_string();
        let mut query: Vec<(&str, String)> = vec![
            ("timeMin", window.start.to_rfc3339()),
            ("timeMax", window.end.to_rfc3339()),
            ("singleEvents", "true".into()),
            ("orderBy", "startTime".into()),
            ("showDeleted", "true".into()),
            ("maxResults", max_results),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response = self
            .http
            .get(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .query(&query)
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(SyncError::ProviderUnavailable(format!(
                "events endpoint returned {status}: {body}"
            )));
        }

        let page: GoogleEventsResponse = response.json().await.map_err(|e| {
            SyncError::ProviderUnavailable(format!("failed to parse events response: {e}"))
        })?;

        let events = page
            .items
            .into_iter()
            .map(|item| convert_event(item, calendar_id))
            .collect::<Result<Vec<_>>>()?;

        Ok(EventsPage { events, next_page_token: page.next_page_token })
    }

    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        draft: &EventDraft,
    ) -> Result<CreatedEvent> {
        let body = serde_json::json!({
            "summary": draft.summary,
            "description": draft.description,
            "location": draft.location,
            "start": { "dateTime": draft.start_at.to_rfc3339(), "timeZone": draft.timezone },
            "end": { "dateTime": draft.end_at.to_rfc3339(), "timeZone": draft.timezone },
        });

        let response = self
            .http
            .post(self.events_url(calendar_id))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_else(|_| "unknown error".to_string());
            return Err(SyncError::ProviderUnavailable(format!(
                "event create returned {status}: {text}"
            )));
        }

        let created: GoogleCreatedEvent = response.json().await.map_err(|e| {
            SyncError::ProviderUnavailable(format!("failed to parse create response: {e}"))
        })?;

        debug!(calendar_id, external_id = %created.id, "created remote event");
        Ok(CreatedEvent { external_id: created.id, meeting_link: created.hangout_link })
    }
}

/// Map one wire event to the normalized domain event.
///
/// Cancelled instances arrive as minimal payloads (id and status only), so
/// missing times default to the epoch; the reconciler only needs the id.
/// A confirmed event without a usable start or end is malformed and fails
/// the whole fetch, carrying the offending record id.
fn convert_event(item: GoogleCalendarEvent, calendar_id: &str) -> Result<RemoteEvent> {
    let status = match item.status.as_deref() {
        Some("cancelled") => RemoteEventStatus::Cancelled,
        _ => RemoteEventStatus::Confirmed,
    };

    let is_all_day = item.start.as_ref().is_some_and(|s| s.date.is_some());
    let start_at = item.start.as_ref().and_then(parse_event_time);
    let end_at = item.end.as_ref().and_then(parse_event_time);

    let (start_at, end_at) = match (start_at, end_at, status) {
        (Some(start), Some(end), _) => (start, end),
        (_, _, RemoteEventStatus::Cancelled) => {
            (DateTime::UNIX_EPOCH, DateTime::UNIX_EPOCH)
        }
        _ => {
            warn!(calendar_id, event_id = %item.id, "confirmed event without usable times");
            return Err(SyncError::ReconciliationConflict {
                event_id: item.id,
                reason: "confirmed event has no usable start or end time".into(),
            });
        }
    };

    let timezone = item.start.as_ref().and_then(|s| s.time_zone.clone());
    let attendees = item
        .attendees
        .unwrap_or_default()
        .into_iter()
        .filter_map(|a| {
            let trimmed = a.email.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect();

    Ok(RemoteEvent {
        external_id: item.id,
        status,
        title: item.summary.filter(|s| !s.trim().is_empty()),
        description: item.description,
        location: item.location,
        start_at,
        end_at,
        is_all_day,
        timezone,
        etag: item.etag,
        meeting_link: item.hangout_link,
        attendees,
        recurrence_rule: item.recurrence.and_then(|rules| rules.into_iter().next()),
        recurring_event_id: item.recurring_event_id,
    })
}

fn parse_event_time(value: &EventDateTime) -> Option<DateTime<Utc>> {
    if let Some(date_time) = &value.date_time {
        return DateTime::parse_from_rfc3339(date_time).ok().map(|dt| dt.with_timezone(&Utc));
    }
    // All-day events carry a bare date; midnight UTC keeps the provider's
    // exclusive end-date convention intact.
    value
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct GoogleEventsResponse {
    #[serde(default)]
    items: Vec<GoogleCalendarEvent>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleCalendarEvent {
    id: String,
    status: Option<String>,
    etag: Option<String>,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start: Option<EventDateTime>,
    end: Option<EventDateTime>,
    #[serde(rename = "recurringEventId")]
    recurring_event_id: Option<String>,
    recurrence: Option<Vec<String>>,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
    attendees: Option<Vec<GoogleAttendee>>,
}

#[derive(Debug, Deserialize)]
struct EventDateTime {
    #[serde(rename = "dateTime")]
    date_time: Option<String>,
    date: Option<String>,
    #[serde(rename = "timeZone")]
    time_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleAttendee {
    email: String,
}

#[derive(Debug, Deserialize)]
struct GoogleCreatedEvent {
    id: String,
    #[serde(rename = "hangoutLink")]
    hangout_link: Option<String>,
}
