//! Resilience subsystem.
//!
//! # Design Decisions
//! - Every external call has a deadline; waiting is always bounded
//! - Polling is a reusable combinator, not an inlined sleep loop
//! - Probe failures are "not yet", never fatal, within a bounded budget

pub mod poll;

pub use poll::poll_until;
