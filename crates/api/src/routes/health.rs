//! Health check route

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::context::AppContext;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// GET /health
///
/// Verifies that a pooled connection can execute a query.
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<HealthResponse>) {
    match ctx.db.health_check() {
        Ok(()) => (StatusCode::OK, Json(HealthResponse { status: "ok", database: "reachable" })),
        Err(err) => {
            warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse { status: "degraded", database: "unreachable" }),
            )
        }
    }
}
