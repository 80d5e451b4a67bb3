//! Telemetry initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber with an env-filter override.
///
/// `default_filter` applies when `RUST_LOG` is unset (e.g. `"apilog=debug"`).
/// Returns false when a subscriber was already installed; subsequent calls
/// are no-ops.
pub fn init_tracing(default_filter: &str) -> bool {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
