//! Tracing setup for test binaries.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Installs a fmt subscriber that writes through the test harness.
///
/// Verbosity follows `RUST_LOG` and defaults to `hwtree_fixture=debug`.
/// Safe to call from every test; only the first call has an effect, and an
/// already-installed global subscriber is left in place.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("hwtree_fixture=debug"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test_tracing();
        init_test_tracing();
        tracing::debug!("still logging after repeated init");
    }
}
