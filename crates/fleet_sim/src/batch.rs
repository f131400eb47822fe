//! Batch driver for Monte Carlo battle estimation.
//!
//! Runs N trials strictly in sequence against one [`RngStream`]. Each
//! trial fights on fresh snapshots of the baseline fleets; the snapshots
//! are dropped when the trial ends, whether the resolver succeeded or not.
//! The statistic is only computed once every trial has finished.

use std::time::Instant;

use fleet_core::combat::{BattleOutcome, CombatResolver, EclipseResolver};
use fleet_core::fleet::Fleet;
use fleet_core::rng::RngStream;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{Result, SimError};

/// Aggregate result of a completed batch.
///
/// Only built after all trials finished, so `trial_count` is always
/// positive and the fractions are always defined. Serialize-only: there is
/// no way to build one from outside data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BatchResult {
    trial_count: u64,
    attacker_wins: u64,
    defender_wins: u64,
    draws: u64,
}

impl BatchResult {
    /// Tally a complete list of outcomes.
    pub fn from_outcomes(outcomes: &[BattleOutcome]) -> Result<Self> {
        if outcomes.is_empty() {
            return Err(SimError::InvalidTrialCount(0));
        }
        let mut tally = Tally::default();
        for &outcome in outcomes {
            tally.record(outcome);
        }
        Ok(tally.finish())
    }

    /// Number of trials run.
    pub fn trial_count(&self) -> u64 {
        self.trial_count
    }

    /// Trials won by the attacker.
    pub fn attacker_wins(&self) -> u64 {
        self.attacker_wins
    }

    /// Trials won by the defender.
    pub fn defender_wins(&self) -> u64 {
        self.defender_wins
    }

    /// Trials without a winner.
    pub fn draws(&self) -> u64 {
        self.draws
    }

    /// Fraction of trials won by the defender, in `[0, 1]`.
    pub fn defender_win_fraction(&self) -> f64 {
        self.defender_wins as f64 / self.trial_count as f64
    }

    /// Fraction of trials won by the attacker, in `[0, 1]`.
    pub fn attacker_win_fraction(&self) -> f64 {
        self.attacker_wins as f64 / self.trial_count as f64
    }

    /// Fraction of drawn trials, in `[0, 1]`.
    pub fn draw_fraction(&self) -> f64 {
        self.draws as f64 / self.trial_count as f64
    }
}

#[derive(Debug, Default)]
struct Tally {
    attacker_wins: u64,
    defender_wins: u64,
    draws: u64,
}

impl Tally {
    fn record(&mut self, outcome: BattleOutcome) {
        match outcome {
            BattleOutcome::AttackerWins => self.attacker_wins += 1,
            BattleOutcome::DefenderWins => self.defender_wins += 1,
            BattleOutcome::Draw => self.draws += 1,
        }
    }

    fn finish(self) -> BatchResult {
        BatchResult {
            trial_count: self.attacker_wins + self.defender_wins + self.draws,
            attacker_wins: self.attacker_wins,
            defender_wins: self.defender_wins,
            draws: self.draws,
        }
    }
}

/// Convert a wire trial count into a positive count.
pub fn checked_trial_count(steps: i64) -> Result<u64> {
    match u64::try_from(steps) {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(SimError::InvalidTrialCount(steps)),
    }
}

/// Runs trials of one fleet pairing.
///
/// Borrows the baseline fleets immutably for its whole life, so nothing
/// can change them while a batch runs.
#[derive(Debug)]
pub struct BatchDriver<'a, C: CombatResolver + ?Sized> {
    attacker: &'a Fleet,
    defender: &'a Fleet,
    resolver: &'a C,
}

impl<'a, C: CombatResolver + ?Sized> BatchDriver<'a, C> {
    /// Create a driver for two baseline fleets.
    pub fn new(attacker: &'a Fleet, defender: &'a Fleet, resolver: &'a C) -> Self {
        Self {
            attacker,
            defender,
            resolver,
        }
    }

    /// Run a batch on a stream built from `seed`.
    ///
    /// The trial count is checked before the stream is created.
    pub fn run(&self, seed: u64, trial_count: u64) -> Result<BatchResult> {
        if trial_count == 0 {
            return Err(SimError::InvalidTrialCount(0));
        }

        let start = Instant::now();
        debug!(
            seed,
            trial_count,
            attacker_ships = self.attacker.ships().len(),
            defender_ships = self.defender.ships().len(),
            "Starting batch"
        );

        let mut rng = RngStream::new(seed);
        let result = self.run_on_stream(&mut rng, trial_count)?;

        info!(
            seed,
            trial_count,
            defender_win_fraction = result.defender_win_fraction(),
            draws = result.draws(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Batch complete"
        );
        Ok(result)
    }

    /// Run a batch on a caller-owned stream.
    ///
    /// The stream is left exactly where the last trial stopped drawing, so
    /// running `k` then `n - k` trials on one stream matches a single run
    /// of `n` trials.
    pub fn run_on_stream(&self, rng: &mut RngStream, trial_count: u64) -> Result<BatchResult> {
        let mut tally = Tally::default();
        self.for_each_trial(rng, trial_count, |outcome| tally.record(outcome))?;
        Ok(tally.finish())
    }

    /// Run trials and return every outcome in trial order.
    pub fn trace(&self, rng: &mut RngStream, trial_count: u64) -> Result<Vec<BattleOutcome>> {
        let mut outcomes = Vec::new();
        self.for_each_trial(rng, trial_count, |outcome| outcomes.push(outcome))?;
        Ok(outcomes)
    }

    /// Resolve one trial on fresh snapshots.
    pub fn resolve_trial(&self, rng: &mut RngStream) -> fleet_core::error::Result<BattleOutcome> {
        let mut attacker = self.attacker.snapshot();
        let mut defender = self.defender.snapshot();
        self.resolver.resolve(&mut attacker, &mut defender, rng)
    }

    fn for_each_trial<F>(&self, rng: &mut RngStream, trial_count: u64, mut record: F) -> Result<()>
    where
        F: FnMut(BattleOutcome),
    {
        if trial_count == 0 {
            return Err(SimError::InvalidTrialCount(0));
        }

        for trial in 0..trial_count {
            let outcome = self.resolve_trial(rng).map_err(|source| {
                warn!(trial, error = %source, "Trial failed, discarding batch");
                SimError::ResolverFailure { trial, source }
            })?;
            trace!(trial, ?outcome, position = %rng.position(), "Trial resolved");
            record(outcome);
        }
        Ok(())
    }
}

/// Run a batch with the default dice resolver.
pub fn run_batch(
    baseline_attacker: &Fleet,
    baseline_defender: &Fleet,
    seed: u64,
    trial_count: u64,
) -> Result<BatchResult> {
    let resolver = EclipseResolver::default();
    BatchDriver::new(baseline_attacker, baseline_defender, &resolver).run(seed, trial_count)
}
