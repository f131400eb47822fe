//! Execution boundary: runs one batch off the caller's thread.
//!
//! The caller submits a [`BatchRequest`] and gets a [`BatchHandle`] back
//! immediately. The batch runs on tokio's blocking pool and answers with
//! exactly one [`BatchResponse`]. Nothing is shared with the worker except
//! the owned request and the boundary's state flag.
//!
//! # States
//!
//! ```text
//! Idle ──submit──> Running ──ok──> Completed ─┐
//!  ▲                  │                        │
//!  │                  └──error──> Failed ──────┤
//!  └───────────────── response delivered ──────┘
//! ```
//!
//! `Completed` and `Failed` are `Idle` with the last outcome kept for
//! inspection, and accept a new request like `Idle` does. A request
//! submitted while `Running` is answered with a boundary error and the
//! in-flight batch is left alone. There is no cancellation.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fleet_core::combat::{CombatResolver, EclipseResolver, Side};
use fleet_core::fleet::Fleet;
use fleet_core::rng::RngStream;
use fleet_core::rules::CombatRules;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::batch::{checked_trial_count, BatchDriver, BatchResult};
use crate::error::{Result, SimError};
use crate::protocol::{BatchRequest, BatchResponse};

/// Parse both fleets, then the trial count.
///
/// Fleets come first, so bad fleet data is reported before the trial
/// count is looked at and before any stream exists.
fn decode(request: &BatchRequest) -> Result<(Fleet, Fleet, u64)> {
    let attacker = request
        .attacker_fleet
        .parse()
        .map_err(|e| SimError::invalid_fleet(Side::Attacker, &e))?;
    let defender = request
        .defender_fleet
        .parse()
        .map_err(|e| SimError::invalid_fleet(Side::Defender, &e))?;
    let trial_count = checked_trial_count(request.simulation_steps)?;
    Ok((attacker, defender, trial_count))
}

/// Process one request synchronously.
pub fn process_request<C>(request: &BatchRequest, resolver: &C) -> Result<BatchResult>
where
    C: CombatResolver + ?Sized,
{
    let (attacker, defender, trial_count) = decode(request)?;

    BatchDriver::new(&attacker, &defender, resolver).run(request.seed, trial_count)
}

/// Rerun a request `runs` times and check every per-trial outcome sequence
/// matches the first one.
pub fn verify_request<C>(request: &BatchRequest, resolver: &C, runs: u32) -> Result<bool>
where
    C: CombatResolver + ?Sized,
{
    let (attacker, defender, trial_count) = decode(request)?;
    let driver = BatchDriver::new(&attacker, &defender, resolver);

    let reference = driver.trace(&mut RngStream::new(request.seed), trial_count)?;
    for run in 1..runs {
        let outcomes = driver.trace(&mut RngStream::new(request.seed), trial_count)?;
        if let Some(trial) = outcomes.iter().zip(&reference).position(|(a, b)| a != b) {
            warn!(run, trial, "Outcome sequence diverged");
            return Ok(false);
        }
    }
    Ok(true)
}

/// Process one request and wrap the outcome as a response.
pub fn handle_request<C>(request: &BatchRequest, resolver: &C) -> BatchResponse
where
    C: CombatResolver + ?Sized,
{
    match process_request(request, resolver) {
        Ok(result) => BatchResponse::completed(result.defender_win_fraction()),
        Err(e) => {
            warn!(category = ?e.category(), "Batch failed: {}", e);
            BatchResponse::failed(&e)
        }
    }
}

/// Decode a wire request.
///
/// A request that does not deserialize never reached the batch, so it is a
/// transport failure rather than bad fleet data.
pub fn decode_request(json: &str) -> Result<BatchRequest> {
    BatchRequest::from_json(json)
        .map_err(|e| SimError::BoundaryError(format!("Malformed request: {}", e)))
}

/// Answer a raw JSON request synchronously.
pub fn handle_json<C>(json: &str, resolver: &C) -> BatchResponse
where
    C: CombatResolver + ?Sized,
{
    match decode_request(json) {
        Ok(request) => handle_request(&request, resolver),
        Err(e) => {
            warn!("{}", e);
            BatchResponse::failed(&e)
        }
    }
}

/// Lifecycle of an [`ExecutionBoundary`].
///
/// `Completed` and `Failed` are the idle state with the last outcome
/// remembered: both return to `Running` on the next submit, exactly as
/// `Idle` does. See [`BoundaryState::is_idle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryState {
    /// No request seen yet.
    #[default]
    Idle,
    /// A batch is in flight.
    Running,
    /// The last batch produced a statistic.
    Completed,
    /// The last batch produced an error.
    Failed,
}

impl BoundaryState {
    /// Whether a new request would be accepted.
    pub fn is_idle(self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// Single-request actor that moves batches off the caller's thread.
pub struct ExecutionBoundary<C = EclipseResolver> {
    runtime: Handle,
    resolver: Arc<C>,
    state: Arc<Mutex<BoundaryState>>,
}

impl ExecutionBoundary<EclipseResolver> {
    /// Boundary using the dice resolver with the given rules.
    pub fn with_rules(runtime: Handle, rules: CombatRules) -> Self {
        Self::new(runtime, EclipseResolver::new(rules))
    }
}

impl<C> ExecutionBoundary<C>
where
    C: CombatResolver + 'static,
{
    /// Create a boundary that spawns work on `runtime`.
    pub fn new(runtime: Handle, resolver: C) -> Self {
        Self {
            runtime,
            resolver: Arc::new(resolver),
            state: Arc::new(Mutex::new(BoundaryState::Idle)),
        }
    }

    /// Create a boundary on the runtime this is called from.
    pub fn current(resolver: C) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| SimError::BoundaryError(format!("No tokio runtime: {}", e)))?;
        Ok(Self::new(runtime, resolver))
    }

    /// Current lifecycle state.
    pub fn state(&self) -> BoundaryState {
        *lock_state(&self.state)
    }

    /// Submit a request. Returns immediately.
    pub fn submit(&self, request: BatchRequest) -> BatchHandle {
        let (tx, rx) = oneshot::channel();

        {
            let mut state = lock_state(&self.state);
            if !state.is_idle() {
                let err = SimError::BoundaryError("A batch is already running".into());
                warn!("Rejected request: {}", err);
                // The receiver is still held below, so this cannot fail.
                let _ = tx.send(BatchResponse::failed(&err));
                return BatchHandle { rx };
            }
            *state = BoundaryState::Running;
        }

        info!(
            seed = request.seed,
            trials = request.simulation_steps,
            "Submitting batch"
        );

        let resolver = Arc::clone(&self.resolver);
        let state = Arc::clone(&self.state);
        self.runtime.spawn_blocking(move || {
            let response =
                panic::catch_unwind(AssertUnwindSafe(|| handle_request(&request, &*resolver)))
                    .unwrap_or_else(|payload| {
                        let err = SimError::BoundaryError(format!(
                            "Batch worker panicked: {}",
                            panic_message(payload.as_ref())
                        ));
                        error!("{}", err);
                        BatchResponse::failed(&err)
                    });

            *lock_state(&state) = match response {
                BatchResponse::Completed { .. } => BoundaryState::Completed,
                BatchResponse::Failed { .. } => BoundaryState::Failed,
            };

            if tx.send(response).is_err() {
                debug!("Caller dropped its handle, response discarded");
            }
        });

        BatchHandle { rx }
    }
}

/// One-shot handle to a submitted batch.
#[derive(Debug)]
pub struct BatchHandle {
    rx: oneshot::Receiver<BatchResponse>,
}

impl BatchHandle {
    /// Wait for the single response.
    pub async fn wait(self) -> BatchResponse {
        self.rx.await.unwrap_or_else(|_| {
            BatchResponse::failed(&SimError::BoundaryError(
                "Batch worker exited without responding".into(),
            ))
        })
    }
}

fn lock_state(state: &Mutex<BoundaryState>) -> MutexGuard<'_, BoundaryState> {
    // The guarded value is a plain enum, always valid after a panic.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
