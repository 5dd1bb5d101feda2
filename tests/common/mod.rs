//! Shared setup for the integration suites.

use tracing_subscriber::EnvFilter;

/// Install the log subscriber once per test binary. Filtered by `RUST_LOG`;
/// output is captured per test and shown only on failure.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
