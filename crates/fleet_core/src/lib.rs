//! # Fleet Core
//!
//! Deterministic fleet battle resolution.
//!
//! This crate contains **only** deterministic logic:
//! - No IO besides explicit file loaders
//! - No system randomness (every draw comes from a seeded [`rng::RngStream`])
//! - Fixed-point target priority (see [`math`])
//!
//! Given the same fleets and the same stream position, a battle always
//! produces the same outcome and consumes the same number of draws.
//!
//! ## Crate Structure
//!
//! - [`ship`] - Ship stats and damage state
//! - [`fleet`] - Fleets, snapshots and the JSON/RON parsing collaborator
//! - [`rng`] - The seeded random stream shared by a batch
//! - [`rules`] - Tunable combat rules
//! - [`combat`] - The combat resolver
//! - [`math`] - Fixed-point helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod error;
pub mod fleet;
pub mod math;
pub mod rng;
pub mod rules;
pub mod ship;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{
        simulate_battle, simulate_round, BattleOutcome, CombatResolver, EclipseResolver, Side,
    };
    pub use crate::error::{CoreError, Result};
    pub use crate::fleet::{parse_fleet, serialize_fleet, Fleet};
    pub use crate::math::Fixed;
    pub use crate::rng::RngStream;
    pub use crate::rules::{CombatRules, InitiativeTieBreak};
    pub use crate::ship::{Ship, ShipType};
}
