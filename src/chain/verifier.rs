//! On-chain payment verification.
//!
//! # Responsibilities
//! - Look up a transaction by hash and wait for it to be mined
//! - Match native transfers against an expected recipient and amount
//! - Match ERC-20 transfers by decoding the receipt's Transfer events
//! - Report confirmation depth (informational only)
//!
//! # Design Decisions
//! - The verify path is infallible: RPC failures, parse failures and
//!   decode failures all collapse to an unverified result. Callers never
//!   see a partial or ambiguous outcome. Retry policy lives with the
//!   caller, not here.
//! - Token amounts use a fixed 6-decimal scale (the common stablecoin
//!   scale). This is a deliberate simplification, not asset introspection.

use alloy::consensus::{Transaction as _, TxReceipt as _};
use alloy::primitives::{Address, TxHash, U256};
use alloy::rpc::types::{Log, TransactionReceipt};
use alloy::sol;
use async_trait::async_trait;
use std::time::Duration;

use crate::chain::client::ChainClient;
use crate::chain::tokens::TOKEN_DECIMALS;
use crate::chain::types::{ChainResult, Verification};
use crate::resilience::poll::poll_until;

sol! {
    /// Standard ERC-20 transfer event.
    #[derive(Debug)]
    event Transfer(address indexed from, address indexed to, uint256 value);
}

/// Absolute tolerance for native-asset amounts, absorbing display rounding.
const NATIVE_TOLERANCE: f64 = 0.0001;

/// Absolute tolerance for token amounts.
const TOKEN_TOLERANCE: f64 = 0.01;

/// Decimal scale of the native asset (wei).
const NATIVE_DECIMALS: u32 = 18;

/// Interval between receipt polls while waiting for a transaction to mine.
const RECEIPT_POLL_SECS: u64 = 2;

/// Verifies transactions against expected payments.
///
/// Holds no state beyond the RPC client; it is a pure request/response
/// collaborator and safe to share.
#[derive(Debug, Clone)]
pub struct ChainVerifier {
    client: ChainClient,
}

impl ChainVerifier {
    /// Create a verifier over an existing chain client.
    pub fn new(client: ChainClient) -> Self {
        Self { client }
    }

    /// Verify that `tx_hash` pays `expected_amount` to `expected_recipient`.
    ///
    /// With a `token_address` the receipt's logs are scanned for a Transfer
    /// event emitted by that contract; without one the transaction's direct
    /// recipient and value are checked. This call blocks while waiting for
    /// the transaction to be mined (bounded by the configured receipt
    /// timeout) and must not be assumed to return instantly.
    pub async fn verify(
        &self,
        tx_hash: &str,
        expected_recipient: &str,
        expected_amount: f64,
        token_address: Option<Address>,
    ) -> Verification {
        let hash: TxHash = match tx_hash.parse() {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!(tx_hash, error = %e, "Malformed transaction hash");
                return Verification::unverified();
            }
        };
        let recipient: Address = match expected_recipient.parse() {
            Ok(a) => a,
            Err(e) => {
                tracing::debug!(recipient = expected_recipient, error = %e, "Malformed recipient address");
                return Verification::unverified();
            }
        };

        let tx = match self.client.transaction_by_hash(hash).await {
            Ok(Some(tx)) => tx,
            Ok(None) => {
                tracing::debug!(%hash, "Transaction not found");
                return Verification::unverified();
            }
            Err(e) => {
                tracing::warn!(%hash, error = %e, "Transaction lookup failed");
                return Verification::unverified();
            }
        };

        let receipt = match self.wait_for_receipt(hash).await {
            Some(r) => r,
            None => {
                tracing::debug!(%hash, "Transaction not mined within receipt timeout");
                return Verification::unverified();
            }
        };

        if !receipt.inner.status() {
            tracing::debug!(%hash, "Transaction reverted");
            return Verification::unverified();
        }

        let mut result = if let Some(token) = token_address {
            match match_token_transfer(receipt.inner.logs(), token, recipient, expected_amount) {
                Some(v) => v,
                None => return Verification::unverified(),
            }
        } else {
            // Native transfer: the transaction's own recipient and value.
            if tx.to() != Some(recipient) {
                tracing::debug!(%hash, "Recipient mismatch on native transfer");
                return Verification::unverified();
            }
            let amount = match units_to_f64(tx.value(), NATIVE_DECIMALS) {
                Some(a) => a,
                None => return Verification::unverified(),
            };
            if !within_tolerance(amount, expected_amount, NATIVE_TOLERANCE) {
                tracing::debug!(%hash, amount, expected_amount, "Amount mismatch on native transfer");
                return Verification::unverified();
            }
            Verification {
                verified: true,
                from: None,
                to: Some(recipient),
                amount: Some(amount),
                block_number: None,
                confirmations: 0,
            }
        };

        result.block_number = receipt.block_number;
        result.confirmations = self.confirmations(receipt.block_number).await;
        result
    }

    /// Current chain head block number.
    pub async fn current_block_height(&self) -> ChainResult<u64> {
        self.client.block_number().await
    }

    /// Poll for the receipt until the transaction is mined or the budget
    /// is exhausted.
    async fn wait_for_receipt(&self, hash: TxHash) -> Option<TransactionReceipt> {
        let attempts =
            (self.client.config().receipt_timeout_secs / RECEIPT_POLL_SECS).max(1) as u32;
        poll_until(Duration::from_secs(RECEIPT_POLL_SECS), attempts, || async {
            self.client.transaction_receipt(hash).await
        })
        .await
    }

    /// head - tx_block + 1; informational, a failed head query reports 0.
    async fn confirmations(&self, tx_block: Option<u64>) -> u64 {
        let Some(tx_block) = tx_block else { return 0 };
        match self.client.block_number().await {
            Ok(head) => head.saturating_sub(tx_block) + 1,
            Err(e) => {
                tracing::debug!(error = %e, "Head query for confirmations failed");
                0
            }
        }
    }
}

/// Verification operations the registry API needs.
///
/// The trait seam lets handler tests substitute a canned verifier; the
/// one production implementation is RPC-backed.
#[async_trait]
pub trait TransactionVerifier: Send + Sync {
    /// See [`ChainVerifier::verify`].
    async fn verify(
        &self,
        tx_hash: &str,
        expected_recipient: &str,
        expected_amount: f64,
        token_address: Option<Address>,
    ) -> Verification;
}

#[async_trait]
impl TransactionVerifier for ChainVerifier {
    async fn verify(
        &self,
        tx_hash: &str,
        expected_recipient: &str,
        expected_amount: f64,
        token_address: Option<Address>,
    ) -> Verification {
        ChainVerifier::verify(self, tx_hash, expected_recipient, expected_amount, token_address)
            .await
    }
}

/// Pure syntactic address check, no network call.
pub fn is_valid_address(address: &str) -> bool {
    address.parse::<Address>().is_ok()
}

/// Scan `logs` for Transfer events emitted by `token` and match the first
/// one that decodes against the expected recipient and amount.
fn match_token_transfer(
    logs: &[Log],
    token: Address,
    expected_recipient: Address,
    expected_amount: f64,
) -> Option<Verification> {
    let transfer = logs
        .iter()
        .filter(|log| log.address() == token)
        .find_map(|log| log.log_decode::<Transfer>().ok().map(|d| d.inner.data))?;

    let amount = units_to_f64(transfer.value, TOKEN_DECIMALS)?;
    let verified = transfer.to == expected_recipient
        && within_tolerance(amount, expected_amount, TOKEN_TOLERANCE);
    if !verified {
        tracing::debug!(
            to = %transfer.to,
            amount,
            expected_amount,
            "Transfer event did not match expected payment"
        );
        return None;
    }

    Some(Verification {
        verified: true,
        from: Some(transfer.from),
        to: Some(transfer.to),
        amount: Some(amount),
        block_number: None,
        confirmations: 0,
    })
}

/// Convert a raw on-chain integer amount into display units.
///
/// Amounts beyond u128 are out of range for any realistic payment and
/// yield `None` (unverified) rather than a lossy conversion.
fn units_to_f64(value: U256, decimals: u32) -> Option<f64> {
    u128::try_from(value)
        .ok()
        .map(|v| v as f64 / 10f64.powi(decimals as i32))
}

fn within_tolerance(actual: f64, expected: f64, tolerance: f64) -> bool {
    (actual - expected).abs() < tolerance
}
