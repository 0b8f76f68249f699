//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured filter when set.

use tracing_subscriber::EnvFilter;

/// Default filter when neither `RUST_LOG` nor the config sets one
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=info";

/// Install the global fmt subscriber.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
