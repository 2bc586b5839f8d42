//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `SYNCLINE_DB_PATH`: Database file path
//! - `SYNCLINE_GOOGLE_CLIENT_ID`: OAuth client id
//! - `SYNCLINE_GOOGLE_CLIENT_SECRET`: OAuth client secret
//!
//! Optional (defaults apply when unset):
//! - `SYNCLINE_DB_POOL_SIZE`: Connection pool size
//! - `SYNCLINE_GOOGLE_API_BASE_URL`: Calendar API base URL
//! - `SYNCLINE_GOOGLE_TOKEN_URL`: OAuth token endpoint
//! - `SYNCLINE_SYNC_LOOKBACK_HOURS`: Fetch window lookback
//! - `SYNCLINE_SYNC_LOOKAHEAD_HOURS`: Fetch window lookahead
//! - `SYNCLINE_SYNC_MAX_RESULTS`: Events page size
//! - `SYNCLINE_SCHEDULER_CRON`: Cron expression for the background sync
//! - `SYNCLINE_SCHEDULER_ENABLED`: Whether the scheduler runs (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./syncline.json` or `./syncline.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use syncline_domain::{
    Config, DatabaseConfig, GoogleApiConfig, Result, SchedulerConfig, SyncConfig, SyncError,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SyncError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// The database path and Google OAuth client credentials are required;
/// everything else falls back to the documented defaults.
///
/// # Errors
/// Returns `SyncError::Config` if required variables are missing or have
/// invalid values.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("SYNCLINE_DB_PATH")?;
    let client_id = env_var("SYNCLINE_GOOGLE_CLIENT_ID")?;
    let client_secret = env_var("SYNCLINE_GOOGLE_CLIENT_SECRET")?;

    let defaults = Config::default();

    let mut google = GoogleApiConfig { client_id, client_secret, ..defaults.google };
    if let Ok(url) = std::env::var("SYNCLINE_GOOGLE_API_BASE_URL") {
        google.api_base_url = url;
    }
    if let Ok(url) = std::env::var("SYNCLINE_GOOGLE_TOKEN_URL") {
        google.token_url = url;
    }

    Ok(Config {
        database: DatabaseConfig {
            path: db_path,
            pool_size: env_parse("SYNCLINE_DB_POOL_SIZE", defaults.database.pool_size)?,
        },
        google,
        sync: SyncConfig {
            lookback_hours: env_parse("SYNCLINE_SYNC_LOOKBACK_HOURS", defaults.sync.lookback_hours)?,
            lookahead_hours: env_parse(
                "SYNCLINE_SYNC_LOOKAHEAD_HOURS",
                defaults.sync.lookahead_hours,
            )?,
            max_results: env_parse("SYNCLINE_SYNC_MAX_RESULTS", defaults.sync.max_results)?,
            ..defaults.sync
        },
        scheduler: SchedulerConfig {
            cron_expression: std::env::var("SYNCLINE_SCHEDULER_CRON")
                .unwrap_or(defaults.scheduler.cron_expression),
            enabled: env_bool("SYNCLINE_SCHEDULER_ENABLED", defaults.scheduler.enabled),
        },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SyncError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("syncline.json"),
            cwd.join("syncline.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("syncline.json"),
                exe_dir.join("syncline.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| SyncError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional numeric environment variable, keeping the default when
/// the variable is unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| SyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
