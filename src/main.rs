//! Latte Registry server binary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;

use latte_registry::chain::{ChainClient, ChainVerifier, TransactionVerifier};
use latte_registry::config::loader::{load_config, load_from_env};
use latte_registry::config::RegistryConfig;
use latte_registry::http::{AppState, HttpServer};
use latte_registry::ledger::PaymentLedger;
use latte_registry::observability;

const DEFAULT_CONFIG_FILE: &str = "latte.toml";

fn load() -> Result<RegistryConfig, Box<dyn std::error::Error>> {
    if let Ok(path) = std::env::var("LATTE_CONFIG") {
        return Ok(load_config(Path::new(&path))?);
    }
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return Ok(load_config(Path::new(DEFAULT_CONFIG_FILE))?);
    }
    Ok(load_from_env()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load()?;
    observability::logging::init(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        chain_id = config.blockchain.chain_id,
        "Starting Latte Registry"
    );

    let ledger = Arc::new(PaymentLedger::open(PathBuf::from(
        &config.storage.ledger_path,
    ))?);
    let client = ChainClient::new(config.blockchain.clone())?;
    let verifier: Arc<dyn TransactionVerifier> = Arc::new(ChainVerifier::new(client));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let state = AppState {
        ledger,
        verifier,
        config: Arc::new(config),
    };

    HttpServer::new(state).run(listener).await?;
    Ok(())
}
