//! Domain data types

pub mod appointment;
pub mod calendar;
pub mod sync_run;

pub use appointment::{Appointment, AppointmentStatus};
pub use calendar::{
    Credential, EventMirror, FetchWindow, RemoteEvent, RemoteEventStatus,
};
pub use sync_run::{SyncOutcome, SyncReport, SyncRunRecord};
