//! Periodic sync scheduler
//!
//! Cron-driven trigger that runs a sync pass over every tenant with an
//! active credential. Join handles are tracked, cancellation is explicit,
//! and every asynchronous operation is wrapped in a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use syncline_core::SyncService;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression describing the execution schedule.
    pub cron_expression: String,
    /// Timeout applied to a single all-tenant sync pass.
    pub job_timeout: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 */15 * * * *".into(), // every 15 minutes
            job_timeout: Duration::from_secs(300),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Background sync scheduler with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    service: Arc<SyncService>,
}

impl SyncScheduler {
    /// Create a scheduler with the default timeouts.
    pub fn new(cron_expression: String, service: Arc<SyncService>) -> Self {
        let config = SyncSchedulerConfig { cron_expression, ..Default::default() };
        Self::with_config(config, service)
    }

    /// Create a scheduler with a custom configuration.
    pub fn with_config(config: SyncSchedulerConfig, service: Arc<SyncService>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            service,
        }
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|_| SchedulerError::Timeout {
                operation: "start",
                seconds: start_timeout.as_secs(),
            })?;

        start_result.map_err(|source| {
            SchedulerError::Runtime(format!("failed to start scheduler: {source}"))
        })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!("Sync scheduler started");
        Ok(())
    }

    /// Stop the scheduler and wait for the monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|_| SchedulerError::Timeout {
                    operation: "stop",
                    seconds: stop_timeout.as_secs(),
                })?;

        stop_result.map_err(|source| {
            SchedulerError::Runtime(format!("failed to stop scheduler: {source}"))
        })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout {
                    operation: "monitor join",
                    seconds: join_timeout.as_secs(),
                })?
                .map_err(|source| SchedulerError::MonitorJoinFailed(source.to_string()))?;
        }

        info!("Sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new().await.map_err(|source| {
            SchedulerError::Runtime(format!("failed to create scheduler: {source}"))
        })?;
        let cron_expr = self.config.cron_expression.clone();
        let service = Arc::clone(&self.service);
        let job_timeout = self.config.job_timeout;

        let job_definition = Job::new_async(cron_expr.as_str(), move |_id, _lock| {
            let service = Arc::clone(&service);

            Box::pin(async move {
                let started = Instant::now();

                match tokio::time::timeout(job_timeout, service.sync_all_tenants()).await {
                    Ok(Ok(completed)) => {
                        debug!(
                            completed,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "scheduled sync pass finished"
                        );
                    }
                    Ok(Err(err)) => {
                        error!(error = %err, "scheduled sync pass failed");
                    }
                    Err(_) => {
                        warn!(
                            timeout_secs = job_timeout.as_secs(),
                            "scheduled sync pass timed out"
                        );
                    }
                }
            })
        })
        .map_err(|source| SchedulerError::InvalidSchedule {
            expression: cron_expr.clone(),
            reason: source.to_string(),
        })?;

        let job_id = job_definition.guid();
        scheduler.add(job_definition).await.map_err(|source| {
            SchedulerError::Runtime(format!("failed to register sync job: {source}"))
        })?;

        debug!(cron = %self.config.cron_expression, job_id = %job_id, "registered sync job");
        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("sync scheduler monitor cancelled");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}
