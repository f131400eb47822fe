//! Error types for fleet parsing and combat resolution.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Top-level error type for the fleet domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Serialized fleet data could not be parsed.
    #[error("Failed to parse {format} fleet data: {message}")]
    FleetParse {
        /// Source format (`json` or `ron`).
        format: &'static str,
        /// Parser error message.
        message: String,
    },

    /// A fleet file could not be read.
    #[error("Failed to read '{path}': {message}")]
    Io {
        /// Path that failed to load.
        path: String,
        /// IO error message.
        message: String,
    },

    /// Combat rules could not be parsed.
    #[error("Failed to parse combat rules: {0}")]
    RulesParse(String),

    /// A ship carries stats the combat rules cannot resolve.
    #[error("Invalid ship at index {index}: {reason}")]
    InvalidShip {
        /// Position of the ship in its fleet.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// Battle did not finish within the configured round cap.
    #[error("Battle still undecided after {rounds} rounds")]
    RoundLimitExceeded {
        /// Number of rounds resolved before giving up.
        rounds: u32,
    },
}
