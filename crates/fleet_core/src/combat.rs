//! Dice combat between two fleets.
//!
//! A battle is a sequence of rounds. In each round ships fire in descending
//! initiative order; at an initiative level shared by both sides the
//! [`InitiativeTieBreak`] decides who shoots first. A ship destroyed before
//! its turn does not fire.
//!
//! Every weapon rolls one die:
//! - a 6 always hits,
//! - a 1 always misses,
//! - anything else hits when `roll + computer >= 6 + shield`.
//!
//! Hits from one volley are pooled and assigned greedily: the pool first
//! destroys the most threatening ship it can, then keeps going, and pours
//! whatever cannot finish a ship into the most threatening ship it reaches.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{CoreError, Result};
use crate::fleet::Fleet;
use crate::math::DIE_FACES;
use crate::rng::RngStream;
use crate::rules::{CombatRules, InitiativeTieBreak};
use crate::ship::Ship;

/// Result of one battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleOutcome {
    /// Only the attacker has ships left.
    AttackerWins,
    /// Only the defender has ships left.
    DefenderWins,
    /// Nobody won: both fleets are gone, or neither can hurt the other.
    Draw,
}

/// One side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The fleet that initiated the battle.
    Attacker,
    /// The fleet holding the sector.
    Defender,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Attacker => f.write_str("attacker"),
            Side::Defender => f.write_str("defender"),
        }
    }
}

/// Resolves a single battle between two fleet snapshots.
///
/// Implementations may mutate both fleets and must draw randomness only
/// from `rng`, so a given pair of fleets and stream position always
/// produces the same outcome.
pub trait CombatResolver: Send + Sync {
    /// Fight until the battle is decided.
    fn resolve(
        &self,
        attacker: &mut Fleet,
        defender: &mut Fleet,
        rng: &mut RngStream,
    ) -> Result<BattleOutcome>;
}

/// The default resolver, implementing the dice rules described above.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EclipseResolver {
    rules: CombatRules,
}

impl EclipseResolver {
    /// Create a resolver with explicit rules.
    #[must_use]
    pub fn new(rules: CombatRules) -> Self {
        Self { rules }
    }

    /// Rules this resolver applies.
    #[must_use]
    pub fn rules(&self) -> &CombatRules {
        &self.rules
    }
}

impl CombatResolver for EclipseResolver {
    fn resolve(
        &self,
        attacker: &mut Fleet,
        defender: &mut Fleet,
        rng: &mut RngStream,
    ) -> Result<BattleOutcome> {
        attacker.validate()?;
        defender.validate()?;
        simulate_battle(attacker, defender, &self.rules, rng)
    }
}

/// Fight full rounds until at most one side has ships left.
pub fn simulate_battle<R: Rng + ?Sized>(
    attacker: &mut Fleet,
    defender: &mut Fleet,
    rules: &CombatRules,
    rng: &mut R,
) -> Result<BattleOutcome> {
    let mut rounds = 0;

    while attacker.has_ships_left() && defender.has_ships_left() {
        if !attacker.can_attack() && !defender.can_attack() {
            trace!(rounds, "Stalemate, neither fleet is armed");
            return Ok(BattleOutcome::Draw);
        }
        if rounds >= rules.max_rounds {
            return Err(CoreError::RoundLimitExceeded { rounds });
        }
        simulate_round(attacker, defender, rules, rng);
        rounds += 1;
    }

    let outcome = match (attacker.has_ships_left(), defender.has_ships_left()) {
        (false, false) => BattleOutcome::Draw,
        (false, true) => BattleOutcome::DefenderWins,
        (true, _) => BattleOutcome::AttackerWins,
    };
    trace!(rounds, ?outcome, "Battle resolved");
    Ok(outcome)
}

/// Fight a single round: every surviving ship fires once, by initiative.
pub fn simulate_round<R: Rng + ?Sized>(
    attacker: &mut Fleet,
    defender: &mut Fleet,
    rules: &CombatRules,
    rng: &mut R,
) {
    let mut levels: Vec<u32> = attacker
        .ships()
        .iter()
        .chain(defender.ships())
        .filter(|ship| ship.is_alive())
        .map(|ship| ship.initiative)
        .collect();
    levels.sort_unstable_by(|a, b| b.cmp(a));
    levels.dedup();

    for initiative in levels {
        if !attacker.has_ships_left() || !defender.has_ships_left() {
            return;
        }

        let order: &[Side] = match (
            ready_at(attacker, initiative),
            ready_at(defender, initiative),
        ) {
            (true, true) => match rules.tie_break {
                InitiativeTieBreak::Defender => &[Side::Defender, Side::Attacker],
                InitiativeTieBreak::Random => {
                    if rng.gen_bool(0.5) {
                        &[Side::Attacker, Side::Defender]
                    } else {
                        &[Side::Defender, Side::Attacker]
                    }
                }
            },
            (true, false) => &[Side::Attacker],
            (false, true) => &[Side::Defender],
            (false, false) => &[],
        };

        for side in order {
            match side {
                Side::Attacker => fire_volley(attacker, defender, initiative, rng),
                Side::Defender => fire_volley(defender, attacker, initiative, rng),
            }
        }
    }
}

fn ready_at(fleet: &Fleet, initiative: u32) -> bool {
    fleet
        .ships()
        .iter()
        .any(|ship| ship.is_alive() && ship.initiative == initiative)
}

/// Roll for every live shooter at `initiative` and apply the hits.
fn fire_volley<R: Rng + ?Sized>(
    shooters: &Fleet,
    targets: &mut Fleet,
    initiative: u32,
    rng: &mut R,
) {
    let mut pool = HitPool::default();
    for ship in shooters
        .ships()
        .iter()
        .filter(|ship| ship.is_alive() && ship.initiative == initiative)
    {
        for damage in ship.weapons() {
            let roll = rng.gen_range(NATURAL_MISS..=NATURAL_HIT);
            pool.push(damage, roll, ship.computer);
        }
    }
    pool.assign(targets);
}

/// A roll that hits whatever the modifiers.
const NATURAL_HIT: u32 = DIE_FACES as u32;
/// A roll that misses whatever the modifiers.
const NATURAL_MISS: u32 = 1;

/// One rolled die waiting to be assigned.
#[derive(Debug, Clone, Copy)]
struct DieRoll {
    damage: u32,
    roll: u32,
    computer: u32,
    spent: bool,
}

impl DieRoll {
    fn reaches(&self, ship: &Ship) -> bool {
        if self.spent || !ship.is_alive() {
            return false;
        }
        match self.roll {
            NATURAL_HIT => true,
            NATURAL_MISS => false,
            roll => roll + self.computer >= NATURAL_HIT + ship.shield,
        }
    }
}

/// The dice of one volley.
///
/// Damage is totalled in `u64`: a volley holds one die per weapon of an
/// unbounded fleet, so a `u32` total can overflow.
#[derive(Debug, Default)]
struct HitPool {
    rolls: Vec<DieRoll>,
}

impl HitPool {
    fn push(&mut self, damage: u32, roll: u32, computer: u32) {
        self.rolls.push(DieRoll {
            damage,
            roll,
            computer,
            spent: false,
        });
    }

    /// Damage the open rolls could deal to `ship`.
    fn potential(&self, ship: &Ship) -> u64 {
        self.rolls
            .iter()
            .filter(|roll| roll.reaches(ship))
            .map(|roll| u64::from(roll.damage))
            .sum()
    }

    /// Spend the largest rolls reaching `ship` until `needed` is covered.
    fn spend_largest(&mut self, ship: &Ship, needed: u64) -> u64 {
        let mut candidates: Vec<usize> = (0..self.rolls.len())
            .filter(|&i| self.rolls[i].reaches(ship))
            .collect();
        candidates.sort_by(|&a, &b| self.rolls[b].damage.cmp(&self.rolls[a].damage));

        let mut dealt = 0;
        for i in candidates {
            if dealt >= needed {
                break;
            }
            self.rolls[i].spent = true;
            dealt += u64::from(self.rolls[i].damage);
        }
        dealt
    }

    /// Spend every roll reaching `ship`.
    fn spend_all(&mut self, ship: &Ship) -> u64 {
        let mut dealt = 0;
        for roll in self.rolls.iter_mut() {
            if roll.reaches(ship) {
                roll.spent = true;
                dealt += u64::from(roll.damage);
            }
        }
        dealt
    }

    fn assign(mut self, targets: &mut Fleet) {
        // Highest threat first; the stable sort keeps fleet order on ties.
        let mut priority: Vec<usize> = (0..targets.ships().len()).collect();
        let ships = targets.ships();
        priority.sort_by(|&a, &b| ships[b].threat().cmp(&ships[a].threat()));

        loop {
            let ships = targets.ships();
            let kill = priority.iter().copied().find(|&i| {
                let ship = &ships[i];
                ship.is_alive() && self.potential(ship) >= u64::from(ship.damage_to_destroy())
            });

            let (index, dealt) = if let Some(index) = kill {
                let needed = u64::from(ships[index].damage_to_destroy());
                (index, self.spend_largest(&ships[index], needed))
            } else if let Some(index) = priority
                .iter()
                .copied()
                .find(|&i| self.potential(&ships[i]) > 0)
            {
                (index, self.spend_all(&ships[index]))
            } else {
                return;
            };

            // Anything past u32::MAX is overkill on a ship capped at MAX_STAT hull.
            targets.ships_mut()[index].take_damage(u32::try_from(dealt).unwrap_or(u32::MAX));
        }
    }
}
