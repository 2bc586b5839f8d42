//! Sync trigger and run-history routes

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use syncline_domain::{SyncError, SyncOutcome, SyncRunRecord};
use tracing::instrument;

use crate::context::AppContext;

/// Body returned for the two non-engaged outcomes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SkippedResponse {
    status: &'static str,
}

/// Error body shared by every failure response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    requires_reconnect: bool,
}

fn error_response(err: &SyncError) -> Response {
    let status = match err {
        SyncError::ReauthorizationRequired(_) => StatusCode::CONFLICT,
        SyncError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
        SyncError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorResponse {
        error: err.to_string(),
        requires_reconnect: err.requires_reconnect(),
    };
    (status, Json(body)).into_response()
}

/// POST /tenants/{tenant_id}/sync
///
/// Runs one sync for the tenant and reports the counts. Non-engaged
/// outcomes (no credential, recent run in flight) return 202 so callers can
/// distinguish "nothing happened" from a completed run.
#[instrument(skip(ctx))]
pub async fn trigger_sync(
    State(ctx): State<AppContext>,
    Path(tenant_id): Path<String>,
) -> Response {
    match ctx.sync_service.sync_now(&tenant_id).await {
        Ok(SyncOutcome::Completed(report)) => (StatusCode::OK, Json(report)).into_response(),
        Ok(SyncOutcome::NotConnected) => {
            (StatusCode::ACCEPTED, Json(SkippedResponse { status: "notConnected" }))
                .into_response()
        }
        Ok(SyncOutcome::SkippedRecentRun) => {
            (StatusCode::ACCEPTED, Json(SkippedResponse { status: "skippedRecentRun" }))
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncRunsQuery {
    limit: Option<usize>,
}

const DEFAULT_RUN_LIMIT: usize = 20;
const MAX_RUN_LIMIT: usize = 100;

/// GET /tenants/{tenant_id}/sync-runs?limit=N
///
/// Recent audit records for the tenant, newest first.
#[instrument(skip(ctx))]
pub async fn list_sync_runs(
    State(ctx): State<AppContext>,
    Path(tenant_id): Path<String>,
    Query(query): Query<SyncRunsQuery>,
) -> Result<Json<Vec<SyncRunRecord>>, Response> {
    let limit = query.limit.unwrap_or(DEFAULT_RUN_LIMIT).min(MAX_RUN_LIMIT);
    let runs = ctx
        .sync_service
        .recent_runs(&tenant_id, limit)
        .await
        .map_err(|err| error_response(&err))?;
    Ok(Json(runs))
}
