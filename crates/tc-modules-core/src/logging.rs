//! Tracing setup for test processes
//!
//! Routes `tracing` output through the test harness writer so it is captured
//! per test and only shown for failures (or with `--nocapture`).

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT_TRACING: Once = Once::new();

/// Default filter when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,tc_modules=debug";

/// Install the global test subscriber
///
/// Safe to call from every test; only the first call installs anything.
/// If another subscriber is already installed, it is left in place.
pub fn init_test_tracing() {
    INIT_TRACING.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_test_writer()
            .try_init();
    });
}
