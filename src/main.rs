//! Fasting Tracker - cycle lifecycle service process.
//!
//! Loads configuration, wires the adapters and keeps the services alive
//! until Ctrl-C.

use fasting_tracker::bootstrap::bootstrap;
use fasting_tracker::config::AppConfig;
use fasting_tracker::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.telemetry);

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Invalid configuration");
        return Err(e.into());
    }

    tracing::info!("Starting fasting tracker");
    let (services, pool) = bootstrap(&config).await.map_err(|e| {
        tracing::error!(error = %e, "Startup failed");
        e
    })?;
    tracing::info!("Fasting tracker ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down...");

    drop(services);
    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}
