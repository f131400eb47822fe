//! Test fixtures and helpers.
//!
//! Pre-built ships and fleets for consistent testing.

use fleet_core::fleet::{serialize_fleet, Fleet};
use fleet_core::ship::{Ship, ShipType};

/// Basic interceptor: 1 hull, initiative 3, one 1-damage cannon.
#[must_use]
pub fn interceptor() -> Ship {
    Ship::new(1, 3, 0, 0, 1, 0, ShipType::Interceptor)
}

/// Basic cruiser: 2 hull, initiative 2, computer 1, one 1-damage cannon.
#[must_use]
pub fn cruiser() -> Ship {
    Ship::new(2, 2, 0, 1, 1, 0, ShipType::Cruiser)
}

/// Basic dreadnought: 3 hull, initiative 1, two 1-damage cannons.
#[must_use]
pub fn dreadnought() -> Ship {
    Ship::new(3, 1, 0, 0, 1, 1, ShipType::Dreadnought)
}

/// Starbase: 2 hull, initiative 4, computer 1, one 1-damage cannon.
#[must_use]
pub fn starbase() -> Ship {
    Ship::new(2, 4, 0, 1, 1, 0, ShipType::Starbase)
}

/// A fleet of `count` copies of `ship`.
#[must_use]
pub fn fleet_of(ship: Ship, count: usize) -> Fleet {
    Fleet::new(vec![ship; count])
}

/// A mixed fleet: interceptors, a cruiser and a dreadnought.
#[must_use]
pub fn mixed_fleet() -> Fleet {
    Fleet::new(vec![
        interceptor(),
        interceptor(),
        cruiser(),
        dreadnought(),
    ])
}

/// Attacker of the 20 v 20 benchmark: 2 hull, shield 1, computer 1, 2-damage cannon.
#[must_use]
pub fn benchmark_attacker() -> Fleet {
    fleet_of(Ship::new(2, 0, 1, 1, 2, 0, ShipType::Interceptor), 20)
}

/// Defender of the 20 v 20 benchmark: same as the attacker with one more hull.
#[must_use]
pub fn benchmark_defender() -> Fleet {
    fleet_of(Ship::new(3, 0, 1, 1, 2, 0, ShipType::Interceptor), 20)
}

/// JSON text of a fleet, as the authoring tool would produce it.
#[must_use]
pub fn fleet_json(fleet: &Fleet) -> String {
    serialize_fleet(fleet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::fleet::parse_fleet;

    #[test]
    fn test_fixture_fleets_are_valid() {
        for fleet in [
            mixed_fleet(),
            benchmark_attacker(),
            benchmark_defender(),
            fleet_of(starbase(), 1),
        ] {
            fleet.validate().unwrap();
            assert!(fleet.has_ships_left());
        }
    }

    #[test]
    fn test_fleet_json_parses_back() {
        let fleet = mixed_fleet();
        assert_eq!(parse_fleet(&fleet_json(&fleet)).unwrap(), fleet);
    }

    #[test]
    fn test_benchmark_sizes() {
        assert_eq!(benchmark_attacker().alive_count(), 20);
        assert_eq!(benchmark_defender().alive_count(), 20);
    }
}
