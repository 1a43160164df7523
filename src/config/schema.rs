//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files,
//! and every field has a default so a minimal (or absent) config works.

use serde::{Deserialize, Serialize};

/// Root configuration for the registry service and CLI.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RegistryConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Blockchain RPC settings.
    pub blockchain: BlockchainConfig,

    /// Payment gating settings.
    pub payments: PaymentsConfig,

    /// Local datastore settings.
    pub storage: StorageConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:4000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:4000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Blockchain RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Chain ID (5000 for Mantle mainnet, 5001 for testnet).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// How long to wait for a transaction to be mined during
    /// verification, in seconds.
    pub receipt_timeout_secs: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://rpc.mantle.xyz".to_string(),
            chain_id: 5000,
            rpc_timeout_secs: 10,
            receipt_timeout_secs: 120,
        }
    }
}

/// Payment gating configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Base URL of the registry API the gate polls.
    pub api_base: String,

    /// Interval between payment-status polls in seconds.
    pub poll_interval_secs: u64,

    /// Total budget for waiting on a required payment, in seconds.
    /// Attempts = confirm_timeout_secs / poll_interval_secs.
    pub confirm_timeout_secs: u64,

    /// Chain name applied when a rule omits one.
    pub default_chain: String,

    /// Token symbol applied when a rule omits one.
    pub default_token: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:4000".to_string(),
            poll_interval_secs: 2,
            confirm_timeout_secs: 60,
            default_chain: "Mantle".to_string(),
            default_token: "USDT".to_string(),
        }
    }
}

/// Local datastore configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the ledger JSON file.
    pub ledger_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_path: "latte-ledger.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Apply environment overrides on top of file/default values.
    ///
    /// Recognized variables: `LATTE_RPC_URL`, `LATTE_CHAIN_ID`,
    /// `LATTE_API_BASE`, `LATTE_LEDGER_PATH`, `LATTE_PORT`.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("LATTE_RPC_URL") {
            self.blockchain.rpc_url = url;
        }
        if let Ok(id) = std::env::var("LATTE_CHAIN_ID") {
            match id.parse() {
                Ok(id) => self.blockchain.chain_id = id,
                Err(_) => tracing::warn!(value = %id, "Ignoring unparseable LATTE_CHAIN_ID"),
            }
        }
        if let Ok(base) = std::env::var("LATTE_API_BASE") {
            self.payments.api_base = base;
        }
        if let Ok(path) = std::env::var("LATTE_LEDGER_PATH") {
            self.storage.ledger_path = path;
        }
        if let Ok(port) = std::env::var("LATTE_PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    let host = self
                        .listener
                        .bind_address
                        .rsplit_once(':')
                        .map(|(host, _)| host.to_string())
                        .unwrap_or_else(|| "0.0.0.0".to_string());
                    self.listener.bind_address = format!("{host}:{port}");
                }
                Err(_) => tracing::warn!(value = %port, "Ignoring unparseable LATTE_PORT"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_documented_values() {
        let config = RegistryConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:4000");
        assert_eq!(config.blockchain.chain_id, 5000);
        assert_eq!(config.payments.poll_interval_secs, 2);
        assert_eq!(config.payments.confirm_timeout_secs, 60);
        assert_eq!(config.storage.ledger_path, "latte-ledger.json");
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let config: RegistryConfig = toml::from_str(
            r#"
            [blockchain]
            chain_id = 5001
            "#,
        )
        .unwrap();
        assert_eq!(config.blockchain.chain_id, 5001);
        assert_eq!(config.blockchain.rpc_timeout_secs, 10);
        assert_eq!(config.payments.default_token, "USDT");
    }
}
