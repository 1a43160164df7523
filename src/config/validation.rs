//! Configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Returns every
//! violation, not just the first, so a bad config can be fixed in one
//! pass.

use std::net::SocketAddr;

use crate::config::schema::RegistryConfig;

/// One semantic violation, rendered for humans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration. Pure function, run before the config is
/// accepted into the system.
pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("'{}' is not a socket address", config.listener.bind_address),
        });
    }
    if config.blockchain.chain_id == 0 {
        errors.push(ValidationError {
            field: "blockchain.chain_id",
            message: "must be non-zero".to_string(),
        });
    }
    if config.blockchain.rpc_timeout_secs == 0 {
        errors.push(ValidationError {
            field: "blockchain.rpc_timeout_secs",
            message: "must be positive".to_string(),
        });
    }
    if config.payments.poll_interval_secs == 0 {
        errors.push(ValidationError {
            field: "payments.poll_interval_secs",
            message: "must be positive".to_string(),
        });
    }
    if config.payments.confirm_timeout_secs < config.payments.poll_interval_secs {
        errors.push(ValidationError {
            field: "payments.confirm_timeout_secs",
            message: "must be at least one poll interval".to_string(),
        });
    }
    if config.storage.ledger_path.is_empty() {
        errors.push(ValidationError {
            field: "storage.ledger_path",
            message: "must not be empty".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
