//! Host process for the aerosense core.
//!
//! Composition root: loads configuration, wires the pool, repositories,
//! provider, gateway, queue, and poller together, starts both loops, and
//! stops them on shutdown signal.

use std::sync::Arc;

use aerosense::config::ConfigLoader;
use aerosense::db;
use aerosense::external::{AeroApiProvider, HttpPushGateway};
use aerosense::logger::init_logger;
use aerosense::poller::FlightPoller;
use aerosense::queue::{DeliveryProcessor, NotificationQueue};
use aerosense::repositories::Repositories;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Malformed or missing settings must prevent startup entirely
    let loader = ConfigLoader::new()?;
    let settings = loader.load()?;

    init_logger(settings.logger.clone().into_logger_config()?)?;

    tracing::info!(
        name = %settings.application.name,
        version = %settings.application.version,
        environment = %loader.environment(),
        "Starting aerosense core"
    );

    if settings.database.auto_migrate {
        let applied = db::run_pending_migrations(&settings.database).await?;
        tracing::info!(applied, "Database migrations applied");
    }

    let pool = db::establish_async_connection_pool(&settings.database).await?;
    let repos = Repositories::new(pool);

    let provider = Arc::new(AeroApiProvider::new(settings.provider.clone()));
    let gateway = Arc::new(HttpPushGateway::new(settings.push.clone()));

    let processor = Arc::new(DeliveryProcessor::new(
        repos.notifications.clone(),
        repos.device_tokens.clone(),
        gateway,
    ));
    let queue = NotificationQueue::new(settings.queue.clone(), processor);

    let poller = FlightPoller::new(
        settings.poller.clone(),
        repos,
        provider,
        None, // no historical on-time stats source wired in
        queue.clone(),
    );

    queue.start();
    poller.start();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    // Stop scheduling immediately; in-flight work finishes naturally
    poller.stop();
    queue.stop();

    Ok(())
}
