//! SQLite-backed implementation of the AppointmentRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use syncline_core::AppointmentRepository;
use syncline_domain::{Appointment, AppointmentStatus, Result, SyncError};
use tracing::{debug, instrument};

use super::{from_ts, to_ts, DbManager};
use crate::errors::InfraError;

/// SQLite implementation of AppointmentRepository
pub struct SqliteAppointmentRepository {
    db: Arc<DbManager>,
}

impl SqliteAppointmentRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert an appointment row. The booking side of the product owns this
    /// table; the sync engine only calls it from tests and tooling.
    pub fn insert(&self, appointment: &Appointment) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO appointments (
                id, tenant_id, service_name, client_name, notes, location,
                start_at, end_at, timezone, status, external_event_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                appointment.id,
                appointment.tenant_id,
                appointment.service_name,
                appointment.client_name,
                appointment.notes,
                appointment.location,
                to_ts(appointment.start_at),
                to_ts(appointment.end_at),
                appointment.timezone,
                appointment.status.as_str(),
                appointment.external_event_id,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

fn parse_status(raw: &str) -> Result<AppointmentStatus> {
    match raw {
        "scheduled" => Ok(AppointmentStatus::Scheduled),
        "confirmed" => Ok(AppointmentStatus::Confirmed),
        "completed" => Ok(AppointmentStatus::Completed),
        "cancelled" => Ok(AppointmentStatus::Cancelled),
        "no_show" => Ok(AppointmentStatus::NoShow),
        other => Err(SyncError::Database(format!("unknown appointment status: {other}"))),
    }
}

struct RawAppointmentRow {
    id: String,
    tenant_id: String,
    service_name: String,
    client_name: String,
    notes: Option<String>,
    location: Option<String>,
    start_ts: i64,
    end_ts: i64,
    timezone: String,
    status: String,
    external_event_id: Option<String>,
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<RawAppointmentRow> {
    Ok(RawAppointmentRow {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        service_name: row.get(2)?,
        client_name: row.get(3)?,
        notes: row.get(4)?,
        location: row.get(5)?,
        start_ts: row.get(6)?,
        end_ts: row.get(7)?,
        timezone: row.get(8)?,
        status: row.get(9)?,
        external_event_id: row.get(10)?,
    })
}

fn raw_to_appointment(raw: RawAppointmentRow) -> Result<Appointment> {
    Ok(Appointment {
        id: raw.id,
        tenant_id: raw.tenant_id,
        service_name: raw.service_name,
        client_name: raw.client_name,
        notes: raw.notes,
        location: raw.location,
        start_at: from_ts(raw.start_ts)?,
        end_at: from_ts(raw.end_ts)?,
        timezone: raw.timezone,
        status: parse_status(&raw.status)?,
        external_event_id: raw.external_event_id,
    })
}

#[async_trait]
impl AppointmentRepository for SqliteAppointmentRepository {
    #[instrument(skip(self))]
    async fn find_unmirrored(
        &self,
        tenant_id: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Vec<Appointment>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, tenant_id, service_name, client_name, notes, location,
                        start_at, end_at, timezone, status, external_event_id
                 FROM appointments
                 WHERE tenant_id = ?1
                   AND external_event_id IS NULL
                   AND status IN ('scheduled', 'confirmed')
                   AND start_at >= ?2
                 ORDER BY start_at ASC",
            )
            .map_err(InfraError::from)?;

        let raw = stmt
            .query_map(params![tenant_id, to_ts(not_before)], row_to_raw)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        debug!(tenant_id, count = raw.len(), "found unmirrored appointments");
        raw.into_iter().map(raw_to_appointment).collect()
    }

    #[instrument(skip(self))]
    async fn set_external_event_id(
        &self,
        appointment_id: &str,
        external_event_id: &str,
    ) -> Result<()> {
        let conn = self.db.get_connection()?;
        let updated = conn
            .execute(
                "UPDATE appointments SET external_event_id = ?2 WHERE id = ?1",
                params![appointment_id, external_event_id],
            )
            .map_err(InfraError::from)?;

        if updated == 0 {
            return Err(SyncError::Database(format!(
                "no appointment row to update: {appointment_id}"
            )));
        }
        Ok(())
    }
}
