//! # Clinicore Worker
//!
//! Background worker for the clinic: scans for upcoming appointments and
//! low stock, and dispatches the outbox effects recorded by the API server.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/clinicore cargo run -p clinicore-worker
//! ```

use clinicore_shared::db::pool::{create_pool, DatabaseConfig};
use clinicore_worker::jobs::{LowStockScan, ReminderScan};
use clinicore_worker::scheduler::Scheduler;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinicore_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Clinicore Worker v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let pool = create_pool(DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await?;

    let scheduler = Scheduler::new(pool)
        .register(ReminderScan::default())
        .register(LowStockScan);
    let shutdown = scheduler.shutdown_token();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    scheduler.run().await;

    tracing::info!("Worker stopped");

    Ok(())
}
