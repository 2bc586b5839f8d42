//! Reconciliation engine
//!
//! Merges fetched remote events into the local mirror table and removes
//! rows for events the provider reports as cancelled. The external event id
//! is the idempotency key, so reconciling the same list twice - or in any
//! order - converges on the same final state.

use std::sync::Arc;

use chrono::Utc;
use syncline_domain::{EventMirror, RemoteEvent, RemoteEventStatus, Result, SyncError};
use tracing::{debug, instrument};

use super::ports::EventMirrorRepository;

/// Counts produced by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Upserts performed; counted unconditionally since upsert is
    /// idempotent regardless of whether the row existed.
    pub synced: usize,
    /// Rows actually removed; re-seeing a cancellation for an absent row is
    /// a no-op, not a deletion.
    pub deleted: usize,
}

/// Merges remote events into the mirror table.
pub struct Reconciler {
    mirrors: Arc<dyn EventMirrorRepository>,
}

impl Reconciler {
    pub fn new(mirrors: Arc<dyn EventMirrorRepository>) -> Self {
        Self { mirrors }
    }

    /// Apply the fetched list to the mirror table.
    ///
    /// Any storage failure aborts the whole pass rather than silently
    /// skipping the record, so a retried run starts from a known-consistent
    /// checkpoint.
    #[instrument(skip(self, events), fields(tenant_id, count = events.len()))]
    pub async fn reconcile(
        &self,
        tenant_id: &str,
        events: &[RemoteEvent],
    ) -> Result<ReconcileOutcome> {
        let mut outcome = ReconcileOutcome::default();
        let synced_at = Utc::now();

        for event in events {
            match event.status {
                RemoteEventStatus::Cancelled => {
                    let removed = self.mirrors.delete(tenant_id, &event.external_id).await?;
                    if removed {
                        debug!(external_id = %event.external_id, "removed cancelled event");
                        outcome.deleted += 1;
                    }
                }
                RemoteEventStatus::Confirmed => {
                    let mirror = EventMirror::from_remote(tenant_id, event, synced_at);
                    self.mirrors.upsert(mirror).await.map_err(|err| match err {
                        SyncError::Database(reason) => SyncError::ReconciliationConflict {
                            event_id: event.external_id.clone(),
                            reason,
                        },
                        other => other,
                    })?;
                    outcome.synced += 1;
                }
            }
        }

        Ok(outcome)
    }
}
