//! HTTP routes

pub mod health;
pub mod sync;

use axum::routing::{get, post};
use axum::Router;

use crate::context::AppContext;

/// Build the application router with all routes mounted.
pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/tenants/{tenant_id}/sync", post(sync::trigger_sync))
        .route("/tenants/{tenant_id}/sync-runs", get(sync::list_sync_runs))
        .with_state(ctx)
}
