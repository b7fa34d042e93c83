//! Test logging: captured by the harness, shown only for failing tests.

use std::sync::Once;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Safe to call from every test; only the first call installs the subscriber.
///
/// Set `RUST_LOG=mock_fraud_checker=debug` to see per-file analysis logs.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mock_fraud_checker=debug"));

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_level(true)
                    .with_target(true)
                    .compact(),
            )
            .with(filter)
            .try_init();
    });
}
