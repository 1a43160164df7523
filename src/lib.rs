//! Latte Registry: payment-gated package registry.
//!
//! A registry API plus a companion CLI that gates package installs on
//! Mantle payments. Package maintainers attach payment rules to their
//! packages; the install path checks those rules, shows a payment
//! request, and (for required payments) blocks until the payment is
//! confirmed on chain.
//!
//! # Architecture
//! ```text
//! latte (CLI)                       latte-registry (server)
//!   gate::PaymentGate  ── HTTP ──►    http::handlers
//!   install::Installer                  ledger::PaymentLedger
//!   lockfile::LockfileStore             chain::ChainVerifier ── RPC ──► Mantle
//! ```

pub mod chain;
pub mod config;
pub mod gate;
pub mod http;
pub mod install;
pub mod ledger;
pub mod lockfile;
pub mod observability;
pub mod resilience;

pub use chain::{ChainClient, ChainVerifier, TransactionVerifier, Verification};
pub use config::RegistryConfig;
pub use gate::{GateDecision, GateOutcome, PaymentGate, RegistryApi, RegistryClient};
pub use ledger::{PackageRule, Payment, PaymentLedger};
pub use lockfile::LockfileStore;
