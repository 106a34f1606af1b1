//! Logging setup

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber that prints to stderr
///
/// The filter is read from `RUST_LOG` and defaults to `info`, e.g.
/// `RUST_LOG=lapse_animation=trace` shows per-frame tween detail. Calling this
/// more than once, or after another subscriber was installed, does nothing.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
