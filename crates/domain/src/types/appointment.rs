//! Local appointment types
//!
//! Appointments are created by the booking side of the product; the sync
//! engine only reads them and records the external event id after a push.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses eligible for mirroring to the remote calendar.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }
}

/// A locally-created appointment (external collaborator's entity).
///
/// `external_event_id` is the push guard: once set, the pusher never issues
/// another create call for this row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub tenant_id: String,
    pub service_name: String,
    pub client_name: String,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub timezone: String,
    pub status: AppointmentStatus,
    pub external_event_id: Option<String>,
}
