//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a JSON-RPC endpoint
//! - Query chain state (block number, transactions, receipts)
//! - Handle timeouts and network errors gracefully

use alloy::primitives::TxHash;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Transaction, TransactionReceipt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::chain::types::{ChainError, ChainResult};
use crate::config::schema::BlockchainConfig;

/// Thin wrapper over an alloy HTTP provider.
///
/// Every call carries a deadline; a hung RPC surfaces as
/// [`ChainError::Timeout`] instead of stalling the caller.
#[derive(Clone)]
pub struct ChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    config: BlockchainConfig,
    timeout_duration: Duration,
}

impl ChainClient {
    /// Create a new chain client from configuration.
    pub fn new(config: BlockchainConfig) -> ChainResult<Self> {
        let url: url::Url = config.rpc_url.parse().map_err(|e: url::ParseError| {
            ChainError::InvalidUrl {
                url: config.rpc_url.clone(),
                reason: e.to_string(),
            }
        })?;

        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        tracing::info!(
            rpc_url = %config.rpc_url,
            chain_id = config.chain_id,
            "Chain client initialized"
        );

        Ok(Self {
            timeout_duration: Duration::from_secs(config.rpc_timeout_secs),
            provider,
            config,
        })
    }

    async fn call<T, F>(&self, fut: F) -> ChainResult<T>
    where
        F: Future<Output = Result<T, alloy::transports::TransportError>>,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ChainError::Rpc(e.to_string())),
            Err(_) => Err(ChainError::Timeout(self.config.rpc_timeout_secs)),
        }
    }

    /// Get the latest block number.
    pub async fn block_number(&self) -> ChainResult<u64> {
        self.call(self.provider.get_block_number()).await
    }

    /// Look up a transaction by hash. `None` means not known to the node,
    /// which callers treat as "not yet" rather than an error.
    pub async fn transaction_by_hash(&self, hash: TxHash) -> ChainResult<Option<Transaction>> {
        self.call(self.provider.get_transaction_by_hash(hash)).await
    }

    /// Get a transaction receipt by hash. `None` until the transaction
    /// is mined.
    pub async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> ChainResult<Option<TransactionReceipt>> {
        self.call(self.provider.get_transaction_receipt(hash)).await
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation_with_valid_url() {
        let config = BlockchainConfig {
            rpc_url: "http://localhost:8545".to_string(),
            ..BlockchainConfig::default()
        };
        // Creation only parses the URL; no network traffic.
        assert!(ChainClient::new(config).is_ok());
    }

    #[test]
    fn client_creation_rejects_bad_url() {
        let config = BlockchainConfig {
            rpc_url: "not a url".to_string(),
            ..BlockchainConfig::default()
        };
        let err = ChainClient::new(config).unwrap_err();
        assert!(err.to_string().contains("invalid RPC URL"));
    }
}
