//! SQLite-backed implementation of the EventMirrorRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use syncline_core::EventMirrorRepository;
use syncline_domain::{EventMirror, Result};
use tracing::{debug, instrument};

use super::{from_ts, to_ts, DbManager};
use crate::errors::InfraError;

/// SQLite implementation of EventMirrorRepository
pub struct SqliteEventMirrorRepository {
    db: Arc<DbManager>,
}

impl SqliteEventMirrorRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Mirror rows for a tenant ordered by start time. Read path for the
    /// product's availability views; also used by tests.
    pub fn list_for_tenant(&self, tenant_id: &str) -> Result<Vec<EventMirror>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT tenant_id, external_event_id, title, description, location,
                        start_at, end_at, is_all_day, timezone, etag, meeting_link,
                        attendees, recurrence_rule, recurring_event_id, last_synced_at
                 FROM event_mirrors
                 WHERE tenant_id = ?1
                 ORDER BY start_at ASC",
            )
            .map_err(InfraError::from)?;

        let raw = stmt
            .query_map(params![tenant_id], row_to_raw)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        raw.into_iter().map(raw_to_mirror).collect()
    }
}

/// Column values before timestamp/JSON decoding.
struct RawMirrorRow {
    tenant_id: String,
    external_event_id: String,
    title: Option<String>,
    description: Option<String>,
    location: Option<String>,
    start_ts: i64,
    end_ts: i64,
    is_all_day: bool,
    timezone: Option<String>,
    etag: Option<String>,
    meeting_link: Option<String>,
    attendees_json: String,
    recurrence_rule: Option<String>,
    recurring_event_id: Option<String>,
    last_synced_ts: i64,
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawMirrorRow> {
    Ok(RawMirrorRow {
        tenant_id: row.get(0)?,
        external_event_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        location: row.get(4)?,
        start_ts: row.get(5)?,
        end_ts: row.get(6)?,
        is_all_day: row.get(7)?,
        timezone: row.get(8)?,
        etag: row.get(9)?,
        meeting_link: row.get(10)?,
        attendees_json: row.get(11)?,
        recurrence_rule: row.get(12)?,
        recurring_event_id: row.get(13)?,
        last_synced_ts: row.get(14)?,
    })
}

fn raw_to_mirror(raw: RawMirrorRow) -> Result<EventMirror> {
    Ok(EventMirror {
        tenant_id: raw.tenant_id,
        external_event_id: raw.external_event_id,
        title: raw.title,
        description: raw.description,
        location: raw.location,
        start_at: from_ts(raw.start_ts)?,
        end_at: from_ts(raw.end_ts)?,
        is_all_day: raw.is_all_day,
        timezone: raw.timezone,
        etag: raw.etag,
        meeting_link: raw.meeting_link,
        attendees: serde_json::from_str(&raw.attendees_json).map_err(InfraError::from)?,
        recurrence_rule: raw.recurrence_rule,
        recurring_event_id: raw.recurring_event_id,
        last_synced_at: from_ts(raw.last_synced_ts)?,
    })
}

#[async_trait]
impl EventMirrorRepository for SqliteEventMirrorRepository {
    #[instrument(skip(self, mirror), fields(tenant_id = %mirror.tenant_id, external_event_id = %mirror.external_event_id))]
    async fn upsert(&self, mirror: EventMirror) -> Result<()> {
        let conn = self.db.get_connection()?;
        let attendees_json = serde_json::to_string(&mirror.attendees).map_err(InfraError::from)?;

        conn.execute(
            "INSERT INTO event_mirrors (
                tenant_id, external_event_id, title, description, location,
                start_at, end_at, is_all_day, timezone, etag, meeting_link,
                attendees, recurrence_rule, recurring_event_id, last_synced_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(tenant_id, external_event_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                location = excluded.location,
                start_at = excluded.start_at,
                end_at = excluded.end_at,
                is_all_day = excluded.is_all_day,
                timezone = excluded.timezone,
                etag = excluded.etag,
                meeting_link = excluded.meeting_link,
                attendees = excluded.attendees,
                recurrence_rule = excluded.recurrence_rule,
                recurring_event_id = excluded.recurring_event_id,
                last_synced_at = excluded.last_synced_at",
            params![
                mirror.tenant_id,
                mirror.external_event_id,
                mirror.title,
                mirror.description,
                mirror.location,
                to_ts(mirror.start_at),
                to_ts(mirror.end_at),
                mirror.is_all_day,
                mirror.timezone,
                mirror.etag,
                mirror.meeting_link,
                attendees_json,
                mirror.recurrence_rule,
                mirror.recurring_event_id,
                to_ts(mirror.last_synced_at),
            ],
        )
        .map_err(InfraError::from)?;

        debug!("inserted/updated event mirror");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, tenant_id: &str, external_event_id: &str) -> Result<bool> {
        let conn = self.db.get_connection()?;
        let removed = conn
            .execute(
                "DELETE FROM event_mirrors WHERE tenant_id = ?1 AND external_event_id = ?2",
                params![tenant_id, external_event_id],
            )
            .map_err(InfraError::from)?;

        Ok(removed > 0)
    }

    #[instrument(skip(self))]
    async fn find(
        &self,
        tenant_id: &str,
        external_event_id: &str,
    ) -> Result<Option<EventMirror>> {
        let conn = self.db.get_connection()?;

        let raw = conn
            .query_row(
                "SELECT tenant_id, external_event_id, title, description, location,
                        start_at, end_at, is_all_day, timezone, etag, meeting_link,
                        attendees, recurrence_rule, recurring_event_id, last_synced_at
                 FROM event_mirrors
                 WHERE tenant_id = ?1 AND external_event_id = ?2",
                params![tenant_id, external_event_id],
                row_to_raw,
            )
            .optional()
            .map_err(InfraError::from)?;

        raw.map(raw_to_mirror).transpose()
    }
}
