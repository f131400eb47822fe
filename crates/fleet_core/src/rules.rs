//! Tunable combat rules.
//!
//! Rules are plain data so they can live in a RON file next to the fleet
//! definitions:
//!
//! ```ron
//! (
//!     tie_break: random,
//!     max_rounds: 500,
//! )
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Default cap on rounds per battle.
pub const DEFAULT_MAX_ROUNDS: u32 = 1000;

/// Who fires first when both sides have ships at the same initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeTieBreak {
    /// The defender always wins ties (board game rule).
    #[default]
    Defender,
    /// A coin flip from the batch stream decides each tie.
    Random,
}

/// Rules applied by the dice combat resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    /// Initiative tie-break policy.
    pub tie_break: InitiativeTieBreak,
    /// Rounds after which an undecided battle is reported as an error.
    pub max_rounds: u32,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            tie_break: InitiativeTieBreak::Defender,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

impl CombatRules {
    /// Set the tie-break policy.
    pub fn with_tie_break(mut self, tie_break: InitiativeTieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    /// Set the round cap.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Parse rules from RON text. Missing fields keep their defaults.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| CoreError::RulesParse(e.to_string()))
    }

    /// Load rules from a `.ron` or JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CoreError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if path.extension().map(|e| e == "ron").unwrap_or(false) {
            Self::from_ron(&text)
        } else {
            serde_json::from_str(&text).map_err(|e| CoreError::RulesParse(e.to_string()))
        }
    }
}
