//! Tracing subscriber setup
//!
//! Installs a global `tracing-subscriber` registry with an `EnvFilter` and
//! either human-readable or JSON output. `RUST_LOG` takes precedence over
//! the configured filter.

use jobhub_domain::LoggingSettings;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber described by `settings`.
///
/// Returns `false` when a subscriber was already installed (tests, or a host
/// application that configured its own); the existing one stays in place.
pub fn init_tracing(settings: &LoggingSettings) -> bool {
    let filter = build_filter(settings);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if settings.json {
        registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(true))
            .try_init()
    } else {
        registry.with(fmt::layer().with_target(false).with_level(true).pretty()).try_init()
    };

    installed.is_ok()
}

fn build_filter(settings: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
