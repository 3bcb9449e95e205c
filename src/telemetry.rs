//! Tracing subscriber initialisation for the binary.

use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter. Calling this twice is a no-op after the first install.
pub fn init_tracing(config: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        tracing::debug!(error = %e, "Tracing subscriber already installed");
    }
}
