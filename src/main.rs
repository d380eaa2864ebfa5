//! # Netrock
//!
//! Application entry point. Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Redis client
//! - Recurring job scheduler
//! - HTTP server

use anyhow::Result;
use tracing::info;

use netrock::config::Settings;
use netrock::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    netrock::telemetry::init_tracing();

    info!("Starting Netrock...");

    let settings = Settings::load()?;
    info!(
        host = %settings.server.host,
        port = %settings.server.port,
        environment = %settings.environment,
        demo = settings.demo.enabled,
        jobs = settings.jobs.enabled,
        "Configuration loaded"
    );

    let application = Application::build(settings).await?;

    info!(addr = %application.local_addr()?, "Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
