//! Registry HTTP boundary.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → server.rs (router, timeout, request ID, trace)
//!     → handlers.rs (parse, validate, shape responses)
//!     → ledger / chain (the actual invariants)
//!     → error.rs (taxonomy → structured JSON errors)
//! ```

pub mod error;
pub mod handlers;
pub mod request;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, AppState, HttpServer};
