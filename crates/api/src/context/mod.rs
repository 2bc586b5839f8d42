//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use syncline_core::SyncService;
use syncline_domain::{Config, Result, SyncError};
use syncline_infra::{
    DbManager, GoogleCalendarClient, SqliteAppointmentRepository, SqliteCredentialRepository,
    SqliteEventMirrorRepository, SqliteSyncRunRepository, SyncScheduler, SyncSchedulerConfig,
};
use tracing::{error, info};

/// Application context - holds all services and dependencies.
///
/// Cheap to clone; every field is an `Arc`. One instance is built at startup
/// and shared with the router as axum state.
#[derive(Clone)]
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub sync_service: Arc<SyncService>,
}

impl AppContext {
    /// Build the full dependency graph from a loaded configuration.
    ///
    /// Opens the connection pool, runs migrations, and wires the SQLite
    /// repositories and the Google client into the sync service.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        info!(path = %db.path().display(), "database ready");

        let credentials = Arc::new(SqliteCredentialRepository::new(Arc::clone(&db)));
        let mirrors = Arc::new(SqliteEventMirrorRepository::new(Arc::clone(&db)));
        let appointments = Arc::new(SqliteAppointmentRepository::new(Arc::clone(&db)));
        let runs = Arc::new(SqliteSyncRunRepository::new(Arc::clone(&db)));
        let google = Arc::new(GoogleCalendarClient::new(config.google.clone(), &config.sync)?);

        let sync_service = Arc::new(SyncService::new(
            credentials,
            mirrors,
            appointments,
            runs,
            google,
            config.sync.clone(),
        ));

        Ok(Self { config, db, sync_service })
    }

    /// Create and start the background scheduler when enabled.
    ///
    /// Returns `None` when the scheduler is disabled in configuration. The
    /// caller owns the returned scheduler and must keep it alive; dropping
    /// it cancels the background job.
    pub async fn start_scheduler(&self) -> Result<Option<SyncScheduler>> {
        if !self.config.scheduler.enabled {
            info!("background scheduler disabled by configuration");
            return Ok(None);
        }

        let scheduler_config = SyncSchedulerConfig {
            cron_expression: self.config.scheduler.cron_expression.clone(),
            ..Default::default()
        };
        let mut scheduler =
            SyncScheduler::with_config(scheduler_config, Arc::clone(&self.sync_service));

        let start_timeout = Duration::from_secs(10);
        tokio::time::timeout(start_timeout, scheduler.start())
            .await
            .map_err(|_| {
                error!(timeout_secs = 10, "SyncScheduler start timed out");
                SyncError::Internal("SyncScheduler start timed out after 10s".into())
            })?
            .map_err(|err| {
                error!(error = %err, "failed to start SyncScheduler");
                SyncError::from(err)
            })?;

        info!(cron = %self.config.scheduler.cron_expression, "background scheduler started");
        Ok(Some(scheduler))
    }
}
