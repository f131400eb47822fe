//! # Fleet Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fleet fixtures
//! - Determinism test harness
//! - Win-rate tolerance checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
