//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for the filter directive:
//! 1. `HABITIZER_LOG` environment variable (e.g. "debug", "habitizer_core=info")
//! 2. `log_filter` from the config file
//! 3. `warn`
//!
//! Logs go to STDERR so stdout carries only JSON output.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HABITIZER_LOG";

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(config_filter: &str) {
    let filter = std::env::var(LOG_ENV)
        .ok()
        .and_then(|s| EnvFilter::try_new(s.trim()).ok())
        .or_else(|| EnvFilter::try_new(config_filter).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init();
}
