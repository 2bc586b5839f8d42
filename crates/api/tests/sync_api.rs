//! End-to-end API tests: axum router wired to a temp SQLite database and a
//! mocked Google Calendar server.

mod support;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use support::{appointment, credential, setup_test_context, setup_with_min_interval};

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("request handled");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body read");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn post_sync(tenant_id: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/tenants/{tenant_id}/sync"))
        .body(Body::empty())
        .expect("request built")
}

fn get_runs(tenant_id: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/tenants/{tenant_id}/sync-runs"))
        .body(Body::empty())
        .expect("request built")
}

#[tokio::test]
async fn health_reports_database_reachable() {
    let ctx = setup_test_context().await;

    let (status, body) =
        send(&ctx.app, Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "reachable");
}

#[tokio::test]
async fn sync_without_credential_reports_not_connected() {
    let ctx = setup_test_context().await;

    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "notConnected");

    // A not-connected invocation leaves no audit trail.
    let (status, runs) = send(&ctx.app, get_runs("tenant-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(runs.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn sync_mirrors_events_and_pushes_appointments() {
    let ctx = setup_test_context().await;
    let now = Utc::now();

    ctx.credentials
        .save(&credential("tenant-1", now + Duration::hours(1)))
        .expect("credential saved");
    ctx.appointments
        .insert(&appointment("appt-1", "tenant-1", now + Duration::hours(2)))
        .expect("appointment saved");

    let start = (now + Duration::hours(3)).to_rfc3339();
    let end = (now + Duration::hours(4)).to_rfc3339();
    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "evt-1",
                    "status": "confirmed",
                    "summary": "Consultation",
                    "start": { "dateTime": start },
                    "end": { "dateTime": end }
                },
                {
                    "id": "evt-2",
                    "status": "confirmed",
                    "summary": "Follow-up",
                    "start": { "dateTime": start },
                    "end": { "dateTime": end }
                },
                { "id": "evt-3", "status": "cancelled" }
            ]
        })))
        .mount(&ctx.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_string_contains("Consultation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "created-1" })))
        .mount(&ctx.server)
        .await;

    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["syncedEvents"], 2);
    assert_eq!(body["deletedEvents"], 0);
    assert_eq!(body["appointmentsPushed"], 1);

    let (status, runs) = send(&ctx.app, get_runs("tenant-1")).await;
    assert_eq!(status, StatusCode::OK);
    let runs = runs.as_array().expect("array body");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["events_synced"], 2);
    assert_eq!(runs[0]["appointments_pushed"], 1);
    assert_eq!(runs[0]["error"], Value::Null);
    assert_eq!(runs[0]["requires_reconnect"], false);
}

#[tokio::test]
async fn rejected_refresh_token_requires_reconnect() {
    let ctx = setup_test_context().await;

    // Expired token forces a refresh attempt.
    ctx.credentials
        .save(&credential("tenant-1", Utc::now() - Duration::hours(1)))
        .expect("credential saved");

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })))
        .mount(&ctx.server)
        .await;

    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["requiresReconnect"], true);

    // The credential is deactivated, so the next trigger finds nothing.
    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "notConnected");

    let (_, runs) = send(&ctx.app, get_runs("tenant-1")).await;
    let runs = runs.as_array().expect("array body");
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0]["requires_reconnect"], true);
}

#[tokio::test]
async fn provider_outage_maps_to_bad_gateway() {
    let ctx = setup_test_context().await;

    ctx.credentials
        .save(&credential("tenant-1", Utc::now() + Duration::hours(1)))
        .expect("credential saved");

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.server)
        .await;

    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["requiresReconnect"], false);
}

#[tokio::test]
async fn rapid_retrigger_is_skipped() {
    let ctx = setup_with_min_interval(30).await;

    ctx.credentials
        .save(&credential("tenant-1", Utc::now() + Duration::hours(1)))
        .expect("credential saved");

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&ctx.server)
        .await;

    let (status, _) = send(&ctx.app, post_sync("tenant-1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&ctx.app, post_sync("tenant-1")).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "skippedRecentRun");
}
