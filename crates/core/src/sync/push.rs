//! Outbound push of local appointments to the remote calendar
//!
//! An appointment is pushed at most once: `external_event_id` is the guard,
//! written synchronously after each successful create and checked (via the
//! unmirrored query) before any create is attempted.

use std::sync::Arc;

use chrono::Utc;
use syncline_domain::{Appointment, Result, SyncError};
use tracing::{info, warn};

use super::ports::{AppointmentRepository, CalendarProvider, EventDraft};

/// Pushes unmirrored active appointments to the provider.
pub struct AppointmentPusher {
    appointments: Arc<dyn AppointmentRepository>,
    provider: Arc<dyn CalendarProvider>,
}

impl AppointmentPusher {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        provider: Arc<dyn CalendarProvider>,
    ) -> Self {
        Self { appointments, provider }
    }

    /// Push every eligible appointment, one create per row.
    ///
    /// A failed create is logged and skipped so one bad appointment cannot
    /// block the rest; the row stays unmirrored and is retried next run. A
    /// failed id write after a successful create is fatal, since continuing
    /// would leave a remote event the engine no longer knows it created.
    pub async fn push_unmirrored(
        &self,
        tenant_id: &str,
        access_token: &str,
        calendar_id: &str,
    ) -> Result<usize> {
        let pending = self.appointments.find_unmirrored(tenant_id, Utc::now()).await?;
        let mut pushed = 0usize;

        for appointment in &pending {
            let draft = Self::draft_for(appointment);

            let created = match self.provider.create_event(access_token, calendar_id, &draft).await
            {
                Ok(created) => created,
                Err(err) => {
                    warn!(
                        tenant_id,
                        appointment_id = %appointment.id,
                        error = %err,
                        "event create failed, will retry next run"
                    );
                    continue;
                }
            };

            self.appointments
                .set_external_event_id(&appointment.id, &created.external_id)
                .await
                .map_err(|err| {
                    SyncError::PushFailure(format!(
                        "created remote event {} for appointment {} but failed to record it: {err}",
                        created.external_id, appointment.id
                    ))
                })?;

            info!(
                tenant_id,
                appointment_id = %appointment.id,
                external_event_id = %created.external_id,
                "appointment pushed"
            );
            pushed += 1;
        }

        Ok(pushed)
    }

    fn draft_for(appointment: &Appointment) -> EventDraft {
        EventDraft {
            summary: format!("{} - {}", appointment.service_name, appointment.client_name),
            description: appointment.notes.clone(),
            location: appointment.location.clone(),
            start_at: appointment.start_at,
            end_at: appointment.end_at,
            timezone: appointment.timezone.clone(),
        }
    }
}
