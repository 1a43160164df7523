//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via tracing; request IDs flow through handlers
//! - Log level from config, overridable via RUST_LOG

pub mod logging;
