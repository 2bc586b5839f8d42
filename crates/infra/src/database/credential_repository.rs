//! SQLite-backed implementation of the CredentialRepository port.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use syncline_core::CredentialRepository;
use syncline_domain::{Credential, Result};
use tracing::{debug, instrument};

use super::{from_ts, to_ts, DbManager};
use crate::errors::InfraError;

/// SQLite implementation of CredentialRepository
pub struct SqliteCredentialRepository {
    db: Arc<DbManager>,
}

impl SqliteCredentialRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Insert or replace the tenant's credential. Used when a tenant
    /// completes the authorization flow, and by tests.
    pub fn save(&self, credential: &Credential) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO calendar_credentials (
                tenant_id, access_token, refresh_token, token_expires_at,
                default_calendar_id, is_active, last_sync_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(tenant_id) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                token_expires_at = excluded.token_expires_at,
                default_calendar_id = excluded.default_calendar_id,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at",
            params![
                credential.tenant_id,
                credential.access_token,
                credential.refresh_token,
                to_ts(credential.token_expires_at),
                credential.default_calendar_id,
                credential.is_active,
                credential.last_sync_at.map(to_ts),
                to_ts(Utc::now()),
            ],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }
}

fn row_to_credential(row: &Row<'_>) -> rusqlite::Result<(Credential, i64, Option<i64>)> {
    Ok((
        Credential {
            tenant_id: row.get(0)?,
            access_token: row.get(1)?,
            refresh_token: row.get(2)?,
            token_expires_at: Utc::now(), // replaced from the raw column below
            default_calendar_id: row.get(4)?,
            is_active: row.get(5)?,
            last_sync_at: None,
        },
        row.get(3)?,
        row.get(6)?,
    ))
}

#[async_trait]
impl CredentialRepository for SqliteCredentialRepository {
    #[instrument(skip(self))]
    async fn find_active(&self, tenant_id: &str) -> Result<Option<Credential>> {
        let conn = self.db.get_connection()?;

        let found = conn
            .query_row(
                "SELECT tenant_id, access_token, refresh_token, token_expires_at,
                        default_calendar_id, is_active, last_sync_at
                 FROM calendar_credentials
                 WHERE tenant_id = ?1 AND is_active = 1",
                params![tenant_id],
                row_to_credential,
            )
            .optional()
            .map_err(InfraError::from)?;

        match found {
            Some((mut credential, expires_ts, last_sync_ts)) => {
                credential.token_expires_at = from_ts(expires_ts)?;
                credential.last_sync_at = last_sync_ts.map(from_ts).transpose()?;
                Ok(Some(credential))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, access_token))]
    async fn update_access_token(
        &self,
        tenant_id: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "UPDATE calendar_credentials
             SET access_token = ?2, token_expires_at = ?3, updated_at = ?4
             WHERE tenant_id = ?1",
            params![tenant_id, access_token, to_ts(expires_at), to_ts(Utc::now())],
        )
        .map_err(InfraError::from)?;

        debug!(tenant_id, "stored refreshed access token");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn mark_inactive(&self, tenant_id: &str) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "UPDATE calendar_credentials SET is_active = 0, updated_at = ?2 WHERE tenant_id = ?1",
            params![tenant_id, to_ts(Utc::now())],
        )
        .map_err(InfraError::from)?;

        debug!(tenant_id, "credential marked inactive");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn update_last_sync(&self, tenant_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.db.get_connection()?;
        conn.execute(
            "UPDATE calendar_credentials SET last_sync_at = ?2, updated_at = ?3 WHERE tenant_id = ?1",
            params![tenant_id, to_ts(at), to_ts(Utc::now())],
        )
        .map_err(InfraError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_active_tenants(&self) -> Result<Vec<String>> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(
                "SELECT tenant_id FROM calendar_credentials WHERE is_active = 1 ORDER BY tenant_id",
            )
            .map_err(InfraError::from)?;

        let tenants = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(InfraError::from)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(InfraError::from)?;

        Ok(tenants)
    }
}
