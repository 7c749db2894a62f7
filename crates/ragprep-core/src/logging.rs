//! Process-wide `tracing` subscriber for the binaries.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "RAGPREP_LOG";

/// Install a fmt subscriber filtered by `RAGPREP_LOG` (default `info`), writing to stderr.
///
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
