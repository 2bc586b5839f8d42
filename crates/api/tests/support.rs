use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Duration, Utc};
use syncline_api::{router, AppContext};
use syncline_domain::{
    Appointment, AppointmentStatus, Config, Credential, DatabaseConfig, GoogleApiConfig,
    SchedulerConfig, SyncConfig,
};
use syncline_infra::{SqliteAppointmentRepository, SqliteCredentialRepository};
use tempfile::TempDir;
use wiremock::MockServer;

/// Shared context for end-to-end API tests: temp database, mocked Google
/// endpoints, and direct repository handles for seeding rows.
pub struct TestContext {
    pub app: Router,
    pub server: MockServer,
    pub credentials: Arc<SqliteCredentialRepository>,
    pub appointments: Arc<SqliteAppointmentRepository>,
    /// Keep the temporary directory alive for the lifetime of the context.
    _temp_dir: TempDir,
}

/// Create a test context with cooperative skipping disabled, so tests can
/// trigger back-to-back syncs.
pub async fn setup_test_context() -> TestContext {
    setup_with_min_interval(0).await
}

pub async fn setup_with_min_interval(min_run_interval_secs: u64) -> TestContext {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let server = MockServer::start().await;

    let config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("syncline.db").to_string_lossy().into_owned(),
            pool_size: 4,
        },
        google: GoogleApiConfig {
            client_id: "client-id".into(),
            client_secret: "client-secret".into(),
            api_base_url: server.uri(),
            token_url: format!("{}/token", server.uri()),
        },
        sync: SyncConfig { min_run_interval_secs, ..Default::default() },
        scheduler: SchedulerConfig { enabled: false, ..Default::default() },
    };

    let ctx = AppContext::new(config).expect("failed to build application context");
    let credentials = Arc::new(SqliteCredentialRepository::new(Arc::clone(&ctx.db)));
    let appointments = Arc::new(SqliteAppointmentRepository::new(Arc::clone(&ctx.db)));

    TestContext { app: router(ctx), server, credentials, appointments, _temp_dir: temp_dir }
}

pub fn credential(tenant_id: &str, token_expires_at: DateTime<Utc>) -> Credential {
    Credential {
        tenant_id: tenant_id.to_string(),
        access_token: "access-token".into(),
        refresh_token: "refresh-token".into(),
        token_expires_at,
        default_calendar_id: "primary".into(),
        is_active: true,
        last_sync_at: None,
    }
}

pub fn appointment(id: &str, tenant_id: &str, start_at: DateTime<Utc>) -> Appointment {
    Appointment {
        id: id.to_string(),
        tenant_id: tenant_id.to_string(),
        service_name: "Consultation".into(),
        client_name: "Alex Doe".into(),
        notes: None,
        location: None,
        start_at,
        end_at: start_at + Duration::hours(1),
        timezone: "UTC".into(),
        status: AppointmentStatus::Scheduled,
        external_event_id: None,
    }
}
