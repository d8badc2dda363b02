//! Tracing configuration for test output.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Initialize tracing for tests.
///
/// Safe to call from every test; only the first call installs a subscriber.
/// Uses `RUST_LOG` when set, otherwise defaults to `info` with harness
/// internals at `debug`.
pub fn init_test_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info,srt_harness=debug"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_ansi(true)
                    .compact(),
            )
            .init();
    });
}

/// Initialize silent tracing, for tests that trigger errors on purpose and
/// don't want the log noise.
pub fn init_test_tracing_silent() {
    INIT.call_once(|| {
        tracing_subscriber::registry()
            .with(EnvFilter::new("off"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .init();
    });
}
