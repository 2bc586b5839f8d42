//! # Syncline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits) for storage and the calendar provider
//! - The sync engine services: token lifecycle, windowed fetch,
//!   reconciliation, appointment push, and the orchestrator
//!
//! ## Architecture Principles
//! - Only depends on `syncline-domain`
//! - No database or HTTP code
//! - All external dependencies via traits
//! - Pure, testable business logic

pub mod sync;

// Re-export specific items to avoid ambiguity
pub use sync::fetch::EventFetcher;
pub use sync::ports::{
    AppointmentRepository, CalendarProvider, CreatedEvent, CredentialRepository, EventDraft,
    EventMirrorRepository, EventsPage, RefreshedToken, SyncRunRepository,
};
pub use sync::push::AppointmentPusher;
pub use sync::reconcile::{ReconcileOutcome, Reconciler};
pub use sync::service::SyncService;
pub use sync::token::TokenManager;
