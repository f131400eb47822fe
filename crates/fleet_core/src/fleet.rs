//! Fleets and the fleet parsing collaborator.
//!
//! A fleet shows up in two phases during a batch:
//!
//! - **Baseline**: parsed once, never mutated while the batch runs.
//! - **Snapshot**: a deep copy made by [`Fleet::snapshot`] for a single
//!   trial, handed to the resolver as `&mut` and dropped when the trial ends.
//!
//! The serialized shape is the one produced by the fleet authoring tool:
//!
//! ```json
//! {"ships":[{"hull":1,"initiative":3,"shield":0,"computer":0,
//!            "weapon_1_dmg":1,"weapon_2_dmg":0,"ship_type":"Interceptor"}]}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ship::Ship;

/// Largest stat value the combat rules accept.
///
/// Keeps per-ship arithmetic away from integer limits. Fleet size is not
/// capped, so volley totals are summed in `u64`.
pub const MAX_STAT: u32 = 10_000;

/// One side's ships.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    /// Create a fleet from ships.
    #[must_use]
    pub fn new(ships: Vec<Ship>) -> Self {
        Self { ships }
    }

    /// Create a fleet with no ships.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// All ships, destroyed ones included.
    #[must_use]
    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Mutable access for the combat resolver.
    pub fn ships_mut(&mut self) -> &mut [Ship] {
        &mut self.ships
    }

    /// Whether the fleet has no ships at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// Whether any ship is still alive.
    #[must_use]
    pub fn has_ships_left(&self) -> bool {
        self.ships.iter().any(Ship::is_alive)
    }

    /// Number of live ships.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.ships.iter().filter(|ship| ship.is_alive()).count()
    }

    /// Whether any live ship can deal damage.
    #[must_use]
    pub fn can_attack(&self) -> bool {
        self.ships
            .iter()
            .any(|ship| ship.is_alive() && ship.is_armed())
    }

    /// Independent deep copy used as one trial's mutable state.
    #[must_use]
    pub fn snapshot(&self) -> Fleet {
        self.clone()
    }

    /// Check that every ship is within the supported stat range.
    pub fn validate(&self) -> Result<()> {
        for (index, ship) in self.ships.iter().enumerate() {
            let stats = [
                ("hull", ship.hull),
                ("initiative", ship.initiative),
                ("shield", ship.shield),
                ("computer", ship.computer),
                ("weapon_1_dmg", ship.weapon_1_dmg),
                ("weapon_2_dmg", ship.weapon_2_dmg),
            ];
            if let Some((name, value)) = stats.iter().find(|(_, value)| *value > MAX_STAT) {
                return Err(CoreError::InvalidShip {
                    index,
                    reason: format!("{name} {value} exceeds maximum {MAX_STAT}"),
                });
            }
        }
        Ok(())
    }

    /// Parse a fleet from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        let fleet: Fleet = ron::from_str(text).map_err(|e| CoreError::FleetParse {
            format: "ron",
            message: e.to_string(),
        })?;
        fleet.validate()?;
        Ok(fleet)
    }

    /// Parse a fleet from an already decoded JSON value.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        let fleet: Fleet = serde_json::from_value(value).map_err(|e| CoreError::FleetParse {
            format: "json",
            message: e.to_string(),
        })?;
        fleet.validate()?;
        Ok(fleet)
    }

    /// Load a fleet file, choosing the format by extension (`.ron` or JSON).
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CoreError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        if path.extension().map(|e| e == "ron").unwrap_or(false) {
            Self::from_ron(&text)
        } else {
            parse_fleet(&text)
        }
    }
}

/// Parse a fleet from its JSON serialized form.
pub fn parse_fleet(serialized: &str) -> Result<Fleet> {
    let fleet: Fleet = serde_json::from_str(serialized).map_err(|e| CoreError::FleetParse {
        format: "json",
        message: e.to_string(),
    })?;
    fleet.validate()?;
    Ok(fleet)
}

/// Serialize a fleet to JSON. Used for diagnostics and fingerprints.
#[must_use]
pub fn serialize_fleet(fleet: &Fleet) -> String {
    // A Fleet is plain data with string keys, so this cannot fail.
    serde_json::to_string(fleet).unwrap_or_default()
}
