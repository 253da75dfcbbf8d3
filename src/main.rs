use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use formrelay::config::Config;
use formrelay::frontend::FrontEnd;
use formrelay::ingest::{IngestLimits, IngestionListener};
use formrelay::store::PgMessageStore;
use formrelay::supervisor::{shutdown_signal, Supervisor};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.log_level)
        }))
        .init();

    tracing::info!("Starting formrelay");

    let store = PgMessageStore::connect(&config.database_url, config.store_timeout)
        .await
        .inspect_err(|e| tracing::error!("{e}"))?;

    // Bind the relay endpoint first so the front-end never starts relaying
    // into a closed port.
    let ingestion = IngestionListener::bind(
        config.relay.addr(),
        Arc::new(store),
        IngestLimits {
            max_payload: config.max_body_size,
            read_timeout: config.relay.read_timeout,
            store_timeout: config.store_timeout,
        },
    )
    .await?;

    let addr = SocketAddr::new(config.host, config.port);
    let front_end = FrontEnd::bind(addr, formrelay::build_app(&config)).await?;

    Supervisor::start(front_end, ingestion)
        .run_until(shutdown_signal())
        .await?;

    tracing::info!("All roles stopped");
    Ok(())
}
