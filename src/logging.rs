use std::sync::Once;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

pub const DEFAULT_FILTER: &str = "mock_fraud_checker=info";

/// Install a global subscriber filtered by `RUST_LOG`.
///
/// For embedding applications; the library never calls this itself. Only the
/// first call has an effect, and an already installed subscriber is left alone.
pub fn init_tracing(json: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        let registry = tracing_subscriber::registry().with(filter);
        let result = if json {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_target(true))
                .try_init()
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().compact().with_target(true))
                .try_init()
        };
        if result.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}
