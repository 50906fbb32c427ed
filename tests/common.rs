//! Shared helpers for the integration tests.

/// Route `log` output through the test harness. Repeated calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
