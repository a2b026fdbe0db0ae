//! Tracing subscriber setup for the binary. Output goes to stderr so stdout
//! stays machine-readable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "HEIC_LOG";
pub const DEFAULT_FILTER: &str = "heic_sim=info";

/// Installs the global subscriber. Safe to call more than once.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
