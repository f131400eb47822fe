//! Monte Carlo batch driver for fleet battles.
//!
//! Given an attacker fleet, a defender fleet, a seed and a trial count,
//! this crate resolves the battle over and over and reports the fraction
//! of trials the defender won. This enables:
//!
//! - **Odds estimation**: how likely a defence holds against an attack
//! - **Reproducible runs**: the same seed always gives the same outcomes
//! - **Responsive callers**: batches run off the caller's thread
//!
//! # Protocol
//!
//! Communication uses one JSON request and one JSON response:
//!
//! - **stdin / file**: a [`protocol::BatchRequest`]
//! - **stdout**: a [`protocol::BatchResponse`] (JSON line)
//! - **stderr**: Debug logs (human-readable)
//!
//! # Example
//!
//! ```bash
//! # Answer a request
//! cargo run -p fleet_sim -- run --request request.json
//!
//! # Run a batch from two fleet files
//! cargo run -p fleet_sim -- batch --attacker a.ron --defender d.json --trials 1000
//!
//! # Verify determinism
//! cargo run -p fleet_sim -- verify --request request.json --runs 5
//! ```

pub mod batch;
pub mod boundary;
pub mod error;
pub mod protocol;

pub use batch::{run_batch, BatchDriver, BatchResult};
pub use boundary::{
    decode_request, handle_json, handle_request, BatchHandle, BoundaryState, ExecutionBoundary,
};
pub use error::{ErrorCategory, Result, SimError};
pub use protocol::{BatchRequest, BatchResponse, ErrorPayload, SerializedFleet};
