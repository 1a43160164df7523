//! Blockchain verification subsystem.
//!
//! # Data Flow
//! ```text
//! verify request (tx hash + expected payment)
//!     → client.rs (RPC lookup with timeout)
//!     → verifier.rs (wait for mined, match recipient/amount)
//!     → Verification { verified, confirmations, ... }
//! ```
//!
//! # Design Decisions
//! - One trusted RPC endpoint; no indexing, no wallet duties
//! - Verification failures are values, never errors
//! - Token matching decodes ERC-20 Transfer events at a fixed 6-decimal scale

pub mod client;
pub mod tokens;
pub mod types;
pub mod verifier;

pub use client::ChainClient;
pub use types::{ChainError, ChainResult, Verification};
pub use verifier::{is_valid_address, ChainVerifier, TransactionVerifier};
