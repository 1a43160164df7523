//! Ledger row types.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Payment rule for one package, keyed by `name`.
///
/// `price == 0` means no payment is configured. A positive price requires
/// a syntactically valid recipient wallet (enforced at the API boundary).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRule {
    pub name: String,
    pub price: f64,
    pub required: bool,
    pub wallet_address: String,
    pub chain: String,
    pub token_symbol: String,
}

/// One payment row, unique per (package, user, tx hash) triple.
///
/// `tx_hash` is absent for manually marked payments; the triple still
/// differentiates via that absence. Once `confirmed` is true it never
/// flips back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub package_name: String,
    pub user_id: String,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub confirmed: bool,
    pub created_at: u64,
}

impl Payment {
    /// Build a new payment row stamped with the current time.
    pub fn new(
        package_name: impl Into<String>,
        user_id: impl Into<String>,
        amount: f64,
        tx_hash: Option<String>,
        confirmed: bool,
    ) -> Self {
        Self {
            package_name: package_name.into(),
            user_id: user_id.into(),
            amount,
            tx_hash,
            confirmed,
            created_at: now_unix(),
        }
    }

    /// The uniqueness key this row is stored under.
    pub(crate) fn key(&self) -> PaymentKey {
        (
            self.package_name.clone(),
            self.user_id.clone(),
            self.tx_hash.clone(),
        )
    }
}

/// (package, user, optional tx hash) uniqueness triple.
pub(crate) type PaymentKey = (String, String, Option<String>);

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Errors from the payment ledger.
///
/// Storage failures are propagated, never swallowed: silent loss of a
/// payment record is unacceptable.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Underlying file I/O failed.
    #[error("ledger storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Persisted ledger data did not parse.
    #[error("ledger data corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
