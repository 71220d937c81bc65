//! Structured logging.
//!
//! Sets up tracing with `RUST_LOG` filtering and compact console output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
///
/// Defaults to DEBUG for this crate in debug builds and INFO in release
/// builds; `RUST_LOG` overrides both.
pub fn init() {
    let default_level = if cfg!(debug_assertions) {
        "audio_switch=debug,info"
    } else {
        "audio_switch=info,warn"
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).compact())
        .try_init();
}
