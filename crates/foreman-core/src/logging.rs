//! Tracing bootstrap.
//!
//! Structured logging for the whole workspace. Filtering follows
//! `FOREMAN_LOG` (falling back to `info`), e.g.
//! `FOREMAN_LOG=foreman_runtime=debug`.

use tracing_subscriber::EnvFilter;

/// Environment variable controlling the log filter.
pub const LOG_ENV_VAR: &str = "FOREMAN_LOG";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls are no-ops (the first
/// subscriber wins). Tests call this freely without coordinating.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
