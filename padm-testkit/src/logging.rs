//! Test-side logging setup.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize tracing for a test binary. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_test_logging() {
    let _ = fmt()
        .with_test_writer()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("padm_testkit=debug".parse().unwrap()),
        )
        .try_init();
}

/// Emit a scenario step marker into the test log.
#[macro_export]
macro_rules! test_log {
    ($($arg:tt)*) => {
        tracing::info!(target: "product", $($arg)*);
    };
}
