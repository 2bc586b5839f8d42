//! Sync orchestrator
//!
//! Runs the full pipeline for one tenant: token resolution, windowed fetch,
//! reconciliation, appointment push, checkpoint. The `last_sync_at`
//! checkpoint only advances after every phase succeeds, so a failed run is
//! fully retried by the next invocation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use syncline_domain::{
    Credential, FetchWindow, Result, SyncConfig, SyncError, SyncOutcome, SyncReport,
    SyncRunRecord,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::fetch::EventFetcher;
use super::ports::{
    AppointmentRepository, CalendarProvider, CredentialRepository, EventMirrorRepository,
    SyncRunRepository,
};
use super::push::AppointmentPusher;
use super::reconcile::Reconciler;
use super::token::TokenManager;

/// Pipeline phase, in execution order. Used for structured log context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncPhase {
    TokenResolving,
    Fetching,
    Reconciling,
    Pushing,
    Checkpointing,
}

impl SyncPhase {
    fn as_str(self) -> &'static str {
        match self {
            Self::TokenResolving => "token_resolving",
            Self::Fetching => "fetching",
            Self::Reconciling => "reconciling",
            Self::Pushing => "pushing",
            Self::Checkpointing => "checkpointing",
        }
    }
}

/// Orchestrates sync runs and records the audit trail.
pub struct SyncService {
    tokens: TokenManager,
    fetcher: EventFetcher,
    reconciler: Reconciler,
    pusher: AppointmentPusher,
    credentials: Arc<dyn CredentialRepository>,
    runs: Arc<dyn SyncRunRepository>,
    config: SyncConfig,
    /// Cooperative skip map: tenant id to the start instant of its most
    /// recent engaged run. Advisory only; correctness under overlap comes
    /// from the idempotency of reconcile and push.
    recent_starts: Mutex<HashMap<String, Instant>>,
}

impl SyncService {
    pub fn new(
        credentials: Arc<dyn CredentialRepository>,
        mirrors: Arc<dyn EventMirrorRepository>,
        appointments: Arc<dyn AppointmentRepository>,
        runs: Arc<dyn SyncRunRepository>,
        provider: Arc<dyn CalendarProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            tokens: TokenManager::new(
                Arc::clone(&credentials),
                Arc::clone(&provider),
                config.token_refresh_margin_secs,
            ),
            fetcher: EventFetcher::new(Arc::clone(&provider)),
            reconciler: Reconciler::new(mirrors),
            pusher: AppointmentPusher::new(appointments, provider),
            credentials,
            runs,
            config,
            recent_starts: Mutex::new(HashMap::new()),
        }
    }

    /// Run one sync for the tenant.
    ///
    /// Returns `NotConnected` without touching storage when no active
    /// credential exists, and `SkippedRecentRun` when another run started
    /// within the configured interval. Every engaged run appends one audit
    /// record, success or failure.
    pub async fn sync_now(&self, tenant_id: &str) -> Result<SyncOutcome> {
        if !self.mark_run_started(tenant_id).await {
            debug!(tenant_id, "sync skipped, another run started recently");
            return Ok(SyncOutcome::SkippedRecentRun);
        }

        let started_at = Utc::now();
        debug!(tenant_id, phase = SyncPhase::TokenResolving.as_str(), "sync phase");

        let credential = match self.tokens.resolve(tenant_id).await {
            Ok(credential) => credential,
            Err(SyncError::CredentialNotFound(_)) => {
                debug!(tenant_id, "no active credential, nothing to sync");
                return Ok(SyncOutcome::NotConnected);
            }
            Err(err) => {
                self.record_run(tenant_id, started_at, SyncReport::default(), Some(&err)).await;
                return Err(err);
            }
        };

        let mut report = SyncReport::default();
        match self.run_pipeline(&credential, &mut report).await {
            Ok(()) => {
                self.record_run(tenant_id, started_at, report, None).await;
                info!(
                    tenant_id,
                    synced = report.synced_events,
                    deleted = report.deleted_events,
                    pushed = report.appointments_pushed,
                    "sync completed"
                );
                Ok(SyncOutcome::Completed(report))
            }
            Err(err) => {
                warn!(tenant_id, error = %err, "sync failed");
                self.record_run(tenant_id, started_at, report, Some(&err)).await;
                Err(err)
            }
        }
    }

    /// Run sync for every tenant with an active credential.
    ///
    /// One tenant's failure never blocks the others; per-tenant errors are
    /// logged and already captured in that tenant's run record. Returns the
    /// number of tenants whose run completed.
    pub async fn sync_all_tenants(&self) -> Result<usize> {
        let tenants = self.credentials.list_active_tenants().await?;
        let mut completed = 0usize;

        for tenant_id in &tenants {
            match self.sync_now(tenant_id).await {
                Ok(SyncOutcome::Completed(_)) => completed += 1,
                Ok(_) => {}
                Err(err) => {
                    warn!(tenant_id, error = %err, "scheduled sync failed for tenant");
                }
            }
        }

        Ok(completed)
    }

    /// Recent audit records for a tenant, newest first.
    pub async fn recent_runs(&self, tenant_id: &str, limit: usize) -> Result<Vec<SyncRunRecord>> {
        self.runs.recent_for_tenant(tenant_id, limit).await
    }

    async fn run_pipeline(&self, credential: &Credential, report: &mut SyncReport) -> Result<()> {
        let tenant_id = credential.tenant_id.as_str();

        debug!(tenant_id, phase = SyncPhase::Fetching.as_str(), "sync phase");
        let window =
            FetchWindow::around(Utc::now(), self.config.lookback_hours, self.config.lookahead_hours);
        let events = self
            .fetcher
            .fetch_window(&credential.access_token, &credential.default_calendar_id, window)
            .await?;

        debug!(tenant_id, phase = SyncPhase::Reconciling.as_str(), "sync phase");
        let outcome = self.reconciler.reconcile(tenant_id, &events).await?;
        report.synced_events = outcome.synced;
        report.deleted_events = outcome.deleted;

        debug!(tenant_id, phase = SyncPhase::Pushing.as_str(), "sync phase");
        report.appointments_pushed = self
            .pusher
            .push_unmirrored(tenant_id, &credential.access_token, &credential.default_calendar_id)
            .await?;

        debug!(tenant_id, phase = SyncPhase::Checkpointing.as_str(), "sync phase");
        self.credentials.update_last_sync(tenant_id, Utc::now()).await?;

        Ok(())
    }

    /// Claim a run slot for the tenant. Returns false when a run started
    /// within `min_run_interval_secs`.
    async fn mark_run_started(&self, tenant_id: &str) -> bool {
        let min_interval = Duration::from_secs(self.config.min_run_interval_secs);
        let mut recent = self.recent_starts.lock().await;
        let now = Instant::now();

        if let Some(last) = recent.get(tenant_id) {
            if now.duration_since(*last) < min_interval {
                return false;
            }
        }
        recent.insert(tenant_id.to_string(), now);
        true
    }

    async fn record_run(
        &self,
        tenant_id: &str,
        started_at: chrono::DateTime<Utc>,
        report: SyncReport,
        error: Option<&SyncError>,
    ) {
        let record = SyncRunRecord {
            id: Uuid::now_v7().to_string(),
            tenant_id: tenant_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            events_synced: report.synced_events,
            events_deleted: report.deleted_events,
            appointments_pushed: report.appointments_pushed,
            error: error.map(ToString::to_string),
            requires_reconnect: error.is_some_and(SyncError::requires_reconnect),
        };

        // Audit append failure must not mask the run result.
        if let Err(append_err) = self.runs.append(&record).await {
            warn!(tenant_id, error = %append_err, "failed to append sync run record");
        }
    }
}
