//! Shared `tracing` setup for the workspace binaries.

use tracing_subscriber::EnvFilter;

/// Builds the filter from `RUST_LOG` when set, otherwise from `fallback`
/// (usually the `log_filter` entry of settings.json).
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the fmt subscriber. A second call is a no-op.
pub fn init(fallback: &str) {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(env_filter(fallback))
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(filter = fallback, "logger initialised");
    }
}
