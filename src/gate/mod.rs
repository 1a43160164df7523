//! Payment gating subsystem.
//!
//! # Data Flow
//! ```text
//! install request (package, user)
//!     → workflow.rs (fetch rule via registry boundary)
//!     → uri.rs (render scannable payment request)
//!     → resilience::poll (bounded status polling for required payments)
//!     → GateDecision { outcome, request }
//! ```

pub mod registry;
pub mod types;
pub mod uri;
pub mod workflow;

pub use registry::{RegistryApi, RegistryClient};
pub use types::{GateDecision, GateOutcome, PaymentRequest, RegistryError, VerifyResponse};
pub use workflow::PaymentGate;
