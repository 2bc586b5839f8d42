//! Tracing initialization

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; defaults to `info` for our crates and `warn` for
/// everything else. Safe to call once at process startup.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("warn,syncline_api=info,syncline_core=info,syncline_infra=info")
    });

    fmt().with_env_filter(filter).with_target(true).init();
}
