//! Log output setup.

use tracing_subscriber::EnvFilter;

/// Installs a global `tracing` subscriber that writes to stderr.
///
/// `RUST_LOG` takes precedence; without it Gatehouse logs at `info` and
/// everything else at `warn`. Calling this again, or after the
/// application installed its own subscriber, does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatehouse=info,warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
