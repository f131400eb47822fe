//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a batch produces identical
//! results given identical inputs.
//!
//! # Testing Strategy
//!
//! A batch must be a pure function of (seed, trial count, baseline fleets).
//! Sources of non-determinism include:
//!
//! - **Stream reuse**: two trials drawing from copies of the same stream
//!   replay identical dice. Streams are not `Clone` for that reason.
//!
//! - **Leaking snapshots**: damage from trial `i` still present in trial
//!   `i + 1`. Every trial gets fresh snapshots.
//!
//! - **Floating-point ordering**: target priority uses fixed-point math.
//!
//! - **System randomness**: no `thread_rng()`, only the seeded stream.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: a single battle replays identically from one seed
//! 2. **Property tests**: arbitrary fleets and seeds stay deterministic
//! 3. **Integration tests**: whole batches reproduce their outcome sequence
//! 4. **Parallel tests**: the same batch on N threads gives N equal results

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>) -> Self {
        let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
        Self {
            is_deterministic,
            hashes,
        }
    }

    /// Get all unique hashes (should be 1 for a deterministic batch).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Batch is non-deterministic!\n\
                 Runs: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a computation multiple times and verify every run agrees.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `run` - Produces the value to compare, e.g. a per-trial outcome list
///
/// # Example
///
/// ```ignore
/// use fleet_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(5, || {
///     let driver = BatchDriver::new(&attacker, &defender, &resolver);
///     driver.trace(&mut RngStream::new(42), 100).unwrap()
/// });
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<T, F>(runs: usize, run: F) -> DeterminismResult
where
    T: Hash,
    F: Fn() -> T,
{
    let hashes = (0..runs).map(|_| compute_hash(&run())).collect();
    DeterminismResult::from_hashes(hashes)
}

/// Run the same computation on `threads` scoped threads and compare.
///
/// Catches hidden shared state: every thread must build its own stream
/// and snapshots, so results cannot depend on scheduling.
pub fn verify_parallel_determinism<T, F>(threads: usize, run: F) -> DeterminismResult
where
    T: Hash,
    F: Fn() -> T + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|_| s.spawn(|| compute_hash(&run())))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    DeterminismResult::from_hashes(hashes)
}

/// Find the first index where two outcome sequences differ.
///
/// Useful for debugging non-determinism by finding exactly which trial
/// diverged. A length mismatch diverges at the end of the shorter one.
///
/// # Returns
///
/// `None` if the sequences are identical, `Some(index)` otherwise.
pub fn find_first_divergence<T: PartialEq>(left: &[T], right: &[T]) -> Option<usize> {
    if let Some(index) = left.iter().zip(right).position(|(a, b)| a != b) {
        return Some(index);
    }
    if left.len() != right.len() {
        return Some(left.len().min(right.len()));
    }
    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
///
/// These strategies generate random but reproducible fleets for
/// property-based testing of batch determinism.
pub mod strategies {
    use fleet_core::fleet::Fleet;
    use fleet_core::ship::{Ship, ShipType};
    use proptest::prelude::*;

    /// Generate any ship type.
    pub fn arb_ship_type() -> impl Strategy<Value = ShipType> {
        prop_oneof![
            Just(ShipType::Interceptor),
            Just(ShipType::Cruiser),
            Just(ShipType::Dreadnought),
            Just(ShipType::Starbase),
        ]
    }

    /// Generate an armed, undamaged ship with board-game sized stats.
    pub fn arb_ship() -> impl Strategy<Value = Ship> {
        (
            0u32..4,
            0u32..5,
            0u32..3,
            0u32..4,
            1u32..5,
            0u32..3,
            arb_ship_type(),
        )
            .prop_map(
                |(hull, initiative, shield, computer, weapon_1_dmg, weapon_2_dmg, ship_type)| {
                    Ship::new(
                        hull,
                        initiative,
                        shield,
                        computer,
                        weapon_1_dmg,
                        weapon_2_dmg,
                        ship_type,
                    )
                },
            )
    }

    /// Generate a fleet of 1 to `max_ships - 1` ships.
    pub fn arb_fleet(max_ships: usize) -> impl Strategy<Value = Fleet> {
        proptest::collection::vec(arb_ship(), 1..max_ships).prop_map(Fleet::new)
    }

    /// Generate a batch seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use fleet_core::combat::{BattleOutcome, CombatResolver, EclipseResolver};
    use fleet_core::rng::RngStream;
    use proptest::prelude::*;

    use crate::fixtures;

    fn outcomes(seed: u64, battles: usize) -> Vec<BattleOutcome> {
        let attacker = fixtures::mixed_fleet();
        let defender = fixtures::fleet_of(fixtures::cruiser(), 3);
        let resolver = EclipseResolver::default();
        let mut rng = RngStream::new(seed);

        (0..battles)
            .map(|_| {
                resolver
                    .resolve(&mut attacker.snapshot(), &mut defender.snapshot(), &mut rng)
                    .unwrap()
            })
            .collect()
    }

    // =========================================================================
    // Harness tests
    // =========================================================================

    #[test]
    fn test_identical_runs_are_deterministic() {
        verify_determinism(3, || outcomes(42, 50)).assert_deterministic();
    }

    #[test]
    fn test_harness_detects_divergence() {
        let counter = std::sync::atomic::AtomicU64::new(0);
        let result = verify_determinism(3, || {
            let seed = counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            outcomes(seed, 50)
        });

        assert!(!result.is_deterministic);
        assert!(result.unique_hashes().len() > 1);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_panics() {
        DeterminismResult::from_hashes(vec![1, 2]).assert_deterministic();
    }

    #[test]
    fn test_parallel_runs_agree() {
        verify_parallel_determinism(4, || outcomes(7, 100)).assert_deterministic();
    }

    #[test]
    fn test_find_first_divergence() {
        assert_eq!(find_first_divergence(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(find_first_divergence(&[1, 2, 3], &[1, 5, 3]), Some(1));
        assert_eq!(find_first_divergence(&[1, 2], &[1, 2, 3]), Some(2));
    }

    // =========================================================================
    // Property-based tests using proptest
    // =========================================================================

    proptest! {
        /// Any pair of fleets replays identically from the same seed.
        #[test]
        fn prop_battles_are_deterministic(
            attacker in arb_fleet(6),
            defender in arb_fleet(6),
            seed in arb_seed(),
        ) {
            let resolver = EclipseResolver::default();
            let result = verify_determinism(2, || {
                let mut a = attacker.snapshot();
                let mut d = defender.snapshot();
                let outcome = resolver.resolve(&mut a, &mut d, &mut RngStream::new(seed));
                (outcome.ok(), a, d)
            });
            prop_assert!(result.is_deterministic);
        }

        /// Resolving a snapshot never touches the baseline.
        #[test]
        fn prop_snapshots_leave_baseline_untouched(
            attacker in arb_fleet(6),
            defender in arb_fleet(6),
            seed in arb_seed(),
        ) {
            let before = (compute_hash(&attacker), compute_hash(&defender));
            let _ = EclipseResolver::default().resolve(
                &mut attacker.snapshot(),
                &mut defender.snapshot(),
                &mut RngStream::new(seed),
            );
            prop_assert_eq!(before, (compute_hash(&attacker), compute_hash(&defender)));
        }
    }
}
