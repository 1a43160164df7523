//! Payment ledger subsystem.
//!
//! # Data Flow
//! ```text
//! API boundary (http handlers)
//!     → store.rs (keyed upserts, invariants enforced here)
//!     → JSON file (persisted after every mutation)
//! ```
//!
//! # Design Decisions
//! - The ledger is the only mutable shared resource in the system
//! - `confirmed` advances false → true and never reverses
//! - Amounts and identities are immutable after first insert

pub mod store;
pub mod types;

pub use store::PaymentLedger;
pub use types::{LedgerError, PackageRule, Payment};
