//! Error types for batches and the execution boundary.

use fleet_core::combat::Side;
use fleet_core::error::CoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using [`SimError`].
pub type Result<T> = std::result::Result<T, SimError>;

/// Everything that can stop a batch from producing a statistic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    /// A serialized fleet could not be turned into a baseline fleet.
    #[error("Invalid {side} fleet data: {message}")]
    InvalidFleetData {
        /// Which fleet failed.
        side: Side,
        /// Parser message.
        message: String,
    },

    /// The trial count was zero or negative.
    #[error("Trial count must be positive, got {0}")]
    InvalidTrialCount(i64),

    /// The combat resolver failed mid-batch; no statistic is reported.
    #[error("Combat resolver failed in trial {trial}: {source}")]
    ResolverFailure {
        /// Zero-based index of the failing trial.
        trial: u64,
        /// Resolver error.
        #[source]
        source: CoreError,
    },

    /// Transport or serialization failure crossing the boundary.
    #[error("Boundary error: {0}")]
    BoundaryError(String),
}

/// Stable machine-readable error category sent over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// See [`SimError::InvalidFleetData`].
    InvalidFleetData,
    /// See [`SimError::InvalidTrialCount`].
    InvalidTrialCount,
    /// See [`SimError::ResolverFailure`].
    ResolverFailure,
    /// See [`SimError::BoundaryError`].
    BoundaryError,
}

impl SimError {
    /// Wire category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidFleetData { .. } => ErrorCategory::InvalidFleetData,
            Self::InvalidTrialCount(_) => ErrorCategory::InvalidTrialCount,
            Self::ResolverFailure { .. } => ErrorCategory::ResolverFailure,
            Self::BoundaryError(_) => ErrorCategory::BoundaryError,
        }
    }

    /// Wrap a fleet parsing error for one side.
    pub fn invalid_fleet(side: Side, error: &CoreError) -> Self {
        Self::InvalidFleetData {
            side,
            message: error.to_string(),
        }
    }
}
