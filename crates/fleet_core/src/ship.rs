//! Ship blueprints and per-battle damage state.

use serde::{Deserialize, Serialize};

use crate::math::{hit_chance, Fixed};

/// Hull class of a ship. Informational only, combat reads the stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShipType {
    /// Small, fast hull.
    #[default]
    Interceptor,
    /// Mid-size hull.
    Cruiser,
    /// Large hull.
    Dreadnought,
    /// Immobile defensive platform.
    Starbase,
}

/// A single ship with its combat stats.
///
/// `hull` counts the hits a ship absorbs beyond the first, so a ship is
/// destroyed once `damage > hull`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ship {
    /// Extra damage the ship survives.
    pub hull: u32,
    /// Firing order; higher fires earlier in a round.
    pub initiative: u32,
    /// Penalty applied to incoming rolls.
    pub shield: u32,
    /// Bonus applied to outgoing rolls.
    pub computer: u32,
    /// Damage of the primary weapon (0 = unarmed).
    pub weapon_1_dmg: u32,
    /// Damage of the secondary weapon (0 = not fitted).
    pub weapon_2_dmg: u32,
    /// Hull class.
    pub ship_type: ShipType,
    /// Damage taken so far in the current battle.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub damage: u32,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Ship {
    /// Create an undamaged ship.
    #[must_use]
    pub fn new(
        hull: u32,
        initiative: u32,
        shield: u32,
        computer: u32,
        weapon_1_dmg: u32,
        weapon_2_dmg: u32,
        ship_type: ShipType,
    ) -> Self {
        Self {
            hull,
            initiative,
            shield,
            computer,
            weapon_1_dmg,
            weapon_2_dmg,
            ship_type,
            damage: 0,
        }
    }

    /// Whether the ship is still in the fight.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.damage <= self.hull
    }

    /// Damage still needed to destroy the ship.
    #[must_use]
    pub fn damage_to_destroy(&self) -> u32 {
        self.hull.saturating_add(1).saturating_sub(self.damage)
    }

    /// Apply damage to the ship.
    pub fn take_damage(&mut self, amount: u32) {
        self.damage = self.damage.saturating_add(amount);
    }

    /// Damage values of the fitted weapons, one entry per die rolled.
    pub fn weapons(&self) -> impl Iterator<Item = u32> {
        [self.weapon_1_dmg, self.weapon_2_dmg]
            .into_iter()
            .filter(|dmg| *dmg > 0)
    }

    /// Whether the ship carries any weapon at all.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.weapons().next().is_some()
    }

    /// Expected damage per volley, used to pick targets.
    ///
    /// Ships that hit harder and more reliably are shot first.
    #[must_use]
    pub fn threat(&self) -> Fixed {
        let total = self.weapon_1_dmg.saturating_add(self.weapon_2_dmg);
        Fixed::saturating_from_num(total).saturating_mul(hit_chance(self.computer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interceptor() -> Ship {
        Ship::new(1, 3, 0, 0, 1, 0, ShipType::Interceptor)
    }

    #[test]
    fn test_ship_destroyed_when_damage_exceeds_hull() {
        let mut ship = interceptor();
        assert!(ship.is_alive());
        assert_eq!(ship.damage_to_destroy(), 2);

        ship.take_damage(1);
        assert!(ship.is_alive());
        assert_eq!(ship.damage_to_destroy(), 1);

        ship.take_damage(1);
        assert!(!ship.is_alive());
        assert_eq!(ship.damage_to_destroy(), 0);
    }

    #[test]
    fn test_zero_hull_dies_to_single_hit() {
        let mut ship = Ship::new(0, 0, 0, 0, 1, 0, ShipType::Interceptor);
        ship.take_damage(1);
        assert!(!ship.is_alive());
    }

    #[test]
    fn test_weapons_skip_empty_slots() {
        let ship = interceptor();
        assert_eq!(ship.weapons().collect::<Vec<_>>(), vec![1]);

        let twin = Ship::new(2, 2, 0, 1, 2, 4, ShipType::Cruiser);
        assert_eq!(twin.weapons().collect::<Vec<_>>(), vec![2, 4]);

        let unarmed = Ship::new(2, 2, 0, 1, 0, 0, ShipType::Starbase);
        assert!(!unarmed.is_armed());
    }

    #[test]
    fn test_threat_orders_by_expected_damage() {
        let light = Ship::new(1, 3, 0, 0, 1, 0, ShipType::Interceptor);
        let heavy = Ship::new(1, 3, 0, 0, 4, 0, ShipType::Interceptor);
        let accurate = Ship::new(1, 3, 0, 2, 1, 0, ShipType::Interceptor);

        assert!(heavy.threat() > light.threat());
        assert!(accurate.threat() > light.threat());
        assert_eq!(Ship::new(1, 0, 0, 0, 0, 0, ShipType::Starbase).threat(), Fixed::ZERO);
    }

    #[test]
    fn test_damage_omitted_when_zero() {
        let json = serde_json::to_string(&interceptor()).unwrap();
        assert!(!json.contains("damage\""));
    }
}
