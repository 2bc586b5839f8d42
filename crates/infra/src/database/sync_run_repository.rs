//! SQLite-backed implementation of the SyncRunRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, Row};
use syncline_core::SyncRunRepository;
use syncline_domain::{Result, SyncRunRecord};
use tracing::instrument;

use super::{from_ts, to_ts, DbManager};
use crate::errors::InfraError;

/// SQLite implementation of SyncRunRepository
pub struct SqliteSyncRunRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncRunRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

fn row_to_raw(row: &Row<'_>) -> rusqlite::Result<(SyncRunRecord, i64, i64)> {
    Ok((
        SyncRunRecord {
            id: row.get(0)?,
            tenant_id: row.get(1)?,
            started_at: chrono::Utc::now(), // replaced from the raw columns below
            finished_at: chrono::Utc::now(),
            events_synced: row.get::<_, i64>(4)? as usize,
            events_deleted: row.get::<_, i64>(5)? as usize,
            appointments_pushed: row.get::<_, i64>(6)? as usize,
            error: row.get(7)?,
            requires_reconnect: row.get(8)?,
        },
        row.get(2)?,
        row.get(3)?,
    ))
}

#[async_trait]
impl SyncRunRepository for SqliteSyncRunRepository {
    #[instrument(skip(self, record), fields(tenant_id = %record.tenant_id, run_id = %record.id))]
    async fn append(&self, record: &SyncRunRecord) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO sync_runs (
                id, tenant_id, started_at, finished_at,
                events_synced, events_deleted, appointments_pushed,
                error, requires_reconnect
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.id,
                record.tenant_id,
                to_ts(record.started_at),
                to_ts(record.finished_at),
                record.events_synced as i64,
                record.events_deleted as i64,
                record.appointments_pushed as i64,
                record.error,
                record.requires_reconnect,
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn recent_for_tenant(
        &self,
        tenant_id: &str,
        limit: usize,
    ) -> Result<Vec<SyncRunRecord>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, tenant_id, started_at, finished_at,
                        events_synced, events_deleted, appointments_pushed,
                        error, requires_reconnect
                 FROM sync_runs
                 WHERE tenant_id = ?1
                 ORDER BY started_at DESC, id DESC
                 LIMIT ?2",
            )
            .map_err(InfraError::from)?;

        let raw = stmt
            .query_map(params![tenant_id, limit as i64], row_to_raw)
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        raw.into_iter()
            .map(|(mut record, started_ts, finished_ts)| {
                record.started_at = from_ts(started_ts)?;
                record.finished_at = from_ts(finished_ts)?;
                Ok(record)
            })
            .collect()
    }
}
