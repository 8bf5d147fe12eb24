use cinder::CacheClient;
use cinder::events::TransportErrorEvent;
use shared::TtlSecs;
use shared::config::{Backend, Config};
use storage_engine::connect_store;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const PROBE_KEY: &str = "cinder:probe";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    let config = Config::from_env();
    match config.backend {
        Backend::Redis => info!("Probing redis backend at {}", config.redis.address()),
        Backend::Memory => info!("Probing in-process memory backend"),
    }

    let store = connect_store(&config).await?;
    let (errors, _) = broadcast::channel::<TransportErrorEvent>(16);
    let client = CacheClient::with_error_broadcaster(store, errors.clone());

    info!("Store alive: {}", client.is_alive());

    let outcome = if config.probe_round_trip {
        round_trip(&client, errors.subscribe()).await
    } else {
        Ok(())
    };

    client.close().await;
    outcome
}

async fn round_trip(
    client: &CacheClient,
    mut errors: broadcast::Receiver<TransportErrorEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let nonce = cinder::events::now_timestamp();
    let result = write_read_delete(client, nonce).await;

    while let Ok(event) = errors.try_recv() {
        warn!(
            "Transport error during probe {} of '{}': {}",
            event.operation.as_str(),
            event.key,
            event.message
        );
    }

    let (read_back, after_delete) = result?;
    if read_back.as_deref() != Some(nonce.to_string().as_str()) || after_delete.is_some() {
        error!(
            "Round trip mismatch: wrote {}, read {:?}, after delete {:?}",
            nonce, read_back, after_delete
        );
        return Err("round trip mismatch".into());
    }

    info!("Round trip ok");
    Ok(())
}

async fn write_read_delete(
    client: &CacheClient,
    nonce: u64,
) -> shared::Result<(Option<String>, Option<String>)> {
    client.set(PROBE_KEY, nonce, TtlSecs(10)).await?;
    let read_back = client.get(PROBE_KEY).await?;
    client.del(PROBE_KEY).await?;
    let after_delete = client.get(PROBE_KEY).await?;
    Ok((read_back, after_delete))
}
