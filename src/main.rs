//! SpinDash - Live speed and cadence dashboard
//!
//! Main entry point for the application.

use spindash::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting SpinDash v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load()?;
    if config.sensors.is_empty() {
        tracing::info!("No sensors configured; connecting to any CSC sensor found");
    }

    let mut app = app::App::new(config).await?;
    app.run().await
}
