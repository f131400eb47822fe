//! JSON protocol for the batch worker.
//!
//! One request in, one response out. Requests carry the two fleets either
//! as JSON strings (the way a web worker posts them) or as inline objects.
//!
//! # Example Exchange
//!
//! ```text
//! -> {"seed":42,"attacker_fleet":"{\"ships\":[...]}","defender_fleet":{"ships":[...]},"simulation_steps":1000}
//! <- {"defender_win_percent":0.512}
//! ```
//!
//! A failed batch never carries `defender_win_percent`:
//!
//! ```text
//! <- {"error":{"category":"invalid_fleet_data","message":"Invalid attacker fleet data: ..."}}
//! ```

use fleet_core::error::Result as CoreResult;
use fleet_core::fleet::{parse_fleet, Fleet};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCategory, SimError};

// ============================================================================
// Request (caller -> worker)
// ============================================================================

/// A single batch request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Seed for the batch's random stream.
    pub seed: u64,
    /// Serialized attacker fleet.
    pub attacker_fleet: SerializedFleet,
    /// Serialized defender fleet.
    pub defender_fleet: SerializedFleet,
    /// Number of trials. Signed so that bad counts reach validation
    /// instead of failing deserialization.
    pub simulation_steps: i64,
}

impl BatchRequest {
    /// Build a request from two in-memory fleets.
    pub fn new(seed: u64, attacker: &Fleet, defender: &Fleet, simulation_steps: i64) -> Self {
        Self {
            seed,
            attacker_fleet: SerializedFleet::from_fleet(attacker),
            defender_fleet: SerializedFleet::from_fleet(defender),
            simulation_steps,
        }
    }

    /// Parse a request from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// A fleet as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SerializedFleet {
    /// Fleet JSON embedded as a string.
    Text(String),
    /// Fleet JSON inlined as an object.
    Inline(serde_json::Value),
}

impl SerializedFleet {
    /// Serialize an in-memory fleet as an inline object.
    pub fn from_fleet(fleet: &Fleet) -> Self {
        Self::Inline(serde_json::to_value(fleet).unwrap_or_default())
    }

    /// Parse and validate the fleet.
    pub fn parse(&self) -> CoreResult<Fleet> {
        match self {
            Self::Text(text) => parse_fleet(text),
            Self::Inline(value) => Fleet::from_json_value(value.clone()),
        }
    }
}

// ============================================================================
// Response (worker -> caller)
// ============================================================================

/// The single response to a [`BatchRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchResponse {
    /// The batch finished.
    Completed {
        /// Fraction of trials won by the defender, in `[0, 1]`.
        defender_win_percent: f64,
    },
    /// The batch failed; no statistic is reported.
    Failed {
        /// What went wrong.
        error: ErrorPayload,
    },
}

/// Error details sent in place of a statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Machine-readable category.
    pub category: ErrorCategory,
    /// Human-readable message.
    pub message: String,
}

impl From<&SimError> for ErrorPayload {
    fn from(error: &SimError) -> Self {
        Self {
            category: error.category(),
            message: error.to_string(),
        }
    }
}

impl BatchResponse {
    /// Successful response.
    pub fn completed(defender_win_percent: f64) -> Self {
        Self::Completed {
            defender_win_percent,
        }
    }

    /// Failure response.
    pub fn failed(error: &SimError) -> Self {
        Self::Failed {
            error: error.into(),
        }
    }

    /// The statistic, if the batch completed.
    pub fn defender_win_percent(&self) -> Option<f64> {
        match self {
            Self::Completed {
                defender_win_percent,
            } => Some(*defender_win_percent),
            Self::Failed { .. } => None,
        }
    }

    /// The error payload, if the batch failed.
    pub fn error(&self) -> Option<&ErrorPayload> {
        match self {
            Self::Completed { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }

    /// Serialize to a JSON line (with trailing newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(
                r#"{{"error":{{"category":"boundary_error","message":"Serialization failed: {}"}}}}"#,
                e
            )
        });
        json.push('\n');
        json
    }

    /// Parse a response from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::combat::Side;
    use fleet_test_utils::fixtures;

    #[test]
    fn test_parse_request_with_string_fleets() {
        let json = r#"{
            "seed": 42,
            "attacker_fleet": "{\"ships\":[{\"hull\":1,\"initiative\":3,\"shield\":0,\"computer\":0,\"weapon_1_dmg\":1,\"weapon_2_dmg\":0,\"ship_type\":\"Interceptor\"}]}",
            "defender_fleet": "{\"ships\":[]}",
            "simulation_steps": 100
        }"#;
        let request = BatchRequest::from_json(json).unwrap();

        assert_eq!(request.seed, 42);
        assert_eq!(request.simulation_steps, 100);
        assert!(matches!(request.attacker_fleet, SerializedFleet::Text(_)));
        assert_eq!(request.attacker_fleet.parse().unwrap().ships().len(), 1);
        assert!(request.defender_fleet.parse().unwrap().is_empty());
    }

    #[test]
    fn test_parse_request_with_inline_fleets() {
        let json = format!(
            r#"{{"seed":7,"attacker_fleet":{},"defender_fleet":{{"ships":[]}},"simulation_steps":-1}}"#,
            fixtures::fleet_json(&fixtures::mixed_fleet())
        );
        let request = BatchRequest::from_json(&json).unwrap();

        assert!(matches!(request.attacker_fleet, SerializedFleet::Inline(_)));
        assert_eq!(request.simulation_steps, -1);
        assert!(!request.attacker_fleet.parse().unwrap().is_empty());
    }

    #[test]
    fn test_request_roundtrips_fleets() {
        let attacker = fixtures::mixed_fleet();
        let defender = fixtures::fleet_of(fixtures::cruiser(), 2);
        let request = BatchRequest::new(3, &attacker, &defender, 10);

        let json = serde_json::to_string(&request).unwrap();
        let parsed = BatchRequest::from_json(&json).unwrap();

        assert_eq!(parsed.attacker_fleet.parse().unwrap(), attacker);
        assert_eq!(parsed.defender_fleet.parse().unwrap(), defender);
    }

    #[test]
    fn test_malformed_text_fleet_fails_to_parse() {
        let fleet = SerializedFleet::Text("{\"ships\": [".into());
        assert!(fleet.parse().is_err());
    }

    #[test]
    fn test_completed_response_json() {
        let line = BatchResponse::completed(0.25).to_json_line();
        assert_eq!(line, "{\"defender_win_percent\":0.25}\n");
    }

    #[test]
    fn test_failed_response_has_no_statistic() {
        let err = SimError::InvalidFleetData {
            side: Side::Attacker,
            message: "bad".into(),
        };
        let response = BatchResponse::failed(&err);
        let line = response.to_json_line();

        assert!(!line.contains("defender_win_percent"));
        assert!(line.contains(r#""category":"invalid_fleet_data""#));
        assert_eq!(response.defender_win_percent(), None);
        assert_eq!(
            response.error().map(|e| e.category),
            Some(ErrorCategory::InvalidFleetData)
        );
    }

    #[test]
    fn test_response_parse_distinguishes_variants() {
        let ok = BatchResponse::from_json(r#"{"defender_win_percent":1.0}"#).unwrap();
        assert_eq!(ok.defender_win_percent(), Some(1.0));

        let failed = BatchResponse::from_json(
            r#"{"error":{"category":"invalid_trial_count","message":"Trial count must be positive, got 0"}}"#,
        )
        .unwrap();
        assert_eq!(failed.defender_win_percent(), None);
        assert_eq!(
            failed.error().map(|e| e.category),
            Some(ErrorCategory::InvalidTrialCount)
        );
    }
}
