//! Application configuration structures
//!
//! Every component receives its settings through these structs; leaf
//! components never read the environment themselves. Loading (env vars,
//! TOML/JSON files) lives in `syncline-infra`.

use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub google: GoogleApiConfig,
    pub sync: SyncConfig,
    pub scheduler: SchedulerConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    pub path: String,
    /// Connection pool size.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "syncline.db".into(), pool_size: default_pool_size() }
    }
}

/// Google Calendar API settings
///
/// Base URLs are overridable so tests can point the client at a local mock
/// server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleApiConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
}

impl Default for GoogleApiConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            api_base_url: default_api_base_url(),
            token_url: default_token_url(),
        }
    }
}

/// Sync engine tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How far back the fetch window reaches, to pick up edits to
    /// recently-past events.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: i64,
    /// How far forward the fetch window reaches, for future bookings.
    #[serde(default = "default_lookahead_hours")]
    pub lookahead_hours: i64,
    /// Safety margin before token expiry that still triggers a refresh.
    #[serde(default = "default_refresh_margin_secs")]
    pub token_refresh_margin_secs: i64,
    /// Page size requested from the events API.
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    /// Timeout applied to every outbound provider call.
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// Cooperative skip: a run is skipped when another run for the same
    /// tenant started within this many seconds.
    #[serde(default = "default_min_run_interval_secs")]
    pub min_run_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_hours: default_lookback_hours(),
            lookahead_hours: default_lookahead_hours(),
            token_refresh_margin_secs: default_refresh_margin_secs(),
            max_results: default_max_results(),
            http_timeout_secs: default_http_timeout_secs(),
            min_run_interval_secs: default_min_run_interval_secs(),
        }
    }
}

/// Background scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Cron expression driving periodic sync for all active tenants.
    #[serde(default = "default_cron_expression")]
    pub cron_expression: String,
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { cron_expression: default_cron_expression(), enabled: default_scheduler_enabled() }
    }
}

fn default_pool_size() -> u32 {
    8
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/calendar/v3".into()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".into()
}

fn default_lookback_hours() -> i64 {
    24 * 7
}

fn default_lookahead_hours() -> i64 {
    24 * 60
}

fn default_refresh_margin_secs() -> i64 {
    60
}

fn default_max_results() -> u32 {
    250
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_min_run_interval_secs() -> u64 {
    30
}

fn default_cron_expression() -> String {
    // every 15 minutes
    "0 */15 * * * *".into()
}

fn default_scheduler_enabled() -> bool {
    true
}
