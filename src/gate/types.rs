//! Payment gate types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal states of the per-install payment decision.
///
/// `NoPaymentNeeded` and `OptionalOffered` always allow the install to
/// proceed; `TimedOut` aborts it for required payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No rule, or price is zero: install proceeds unconditionally.
    NoPaymentNeeded,
    /// A donation was offered; installation is never blocked by a
    /// declined or ignored donation.
    OptionalOffered,
    /// Required payment confirmed within the polling budget.
    Confirmed,
    /// Required payment never confirmed; install must abort.
    TimedOut,
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPaymentNeeded => write!(f, "no payment needed"),
            Self::OptionalOffered => write!(f, "optional donation offered"),
            Self::Confirmed => write!(f, "payment confirmed"),
            Self::TimedOut => write!(f, "payment timed out"),
        }
    }
}

/// Rendered payment request shown to the user.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub package_name: String,
    pub amount: f64,
    pub token_symbol: String,
    pub chain: String,
    pub recipient: String,
    /// EIP-681 URI for wallets to scan.
    pub uri: String,
}

/// Result of running the gate for one install.
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub outcome: GateOutcome,
    /// Present whenever a priced rule exists (required or optional).
    pub request: Option<PaymentRequest>,
}

impl GateDecision {
    /// Whether the installer may proceed.
    pub fn allows_install(&self) -> bool {
        self.outcome != GateOutcome::TimedOut
    }
}

/// Response of the registry's verify endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Errors from talking to the registry boundary.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry returned status {status}: {body}")]
    Status { status: u16, body: String },
}
