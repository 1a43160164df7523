//! Chain-specific types and error definitions.

use alloy::primitives::Address;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during blockchain RPC operations.
///
/// These never escape the verifier: every failure on the verification
/// path collapses to an unverified result.
#[derive(Debug, Error)]
pub enum ChainError {
    /// RPC connection or request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Malformed RPC endpoint URL.
    #[error("invalid RPC URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Result type for blockchain operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Outcome of verifying a transaction against an expected payment.
///
/// `verified` is the only field callers gate on. The rest is context for
/// logging and API responses; `confirmations` is informational and never
/// affects the verdict.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    pub confirmations: u64,
}

impl Verification {
    /// The single failure value: nothing matched, nothing leaked.
    pub fn unverified() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unverified_is_empty() {
        let v = Verification::unverified();
        assert!(!v.verified);
        assert!(v.amount.is_none());
        assert_eq!(v.confirmations, 0);
    }

    #[test]
    fn error_display() {
        let err = ChainError::Timeout(10);
        assert_eq!(err.to_string(), "RPC timeout after 10 seconds");
    }
}
