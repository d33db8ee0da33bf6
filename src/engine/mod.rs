//! Core simulation engine.
//!
//! Runs one IR as a sequential loop of time steps:
//!
//! ```text
//! Initializing -> Stepping <-> EventHandling -> Completed | Failed
//! ```
//!
//! - Initializing builds the t = 0 sample from the IR entities.
//! - Stepping advances every entity with the IR's [`DomainRule`], adapting
//!   the step size and retrying non-finite steps at half size.
//! - One sample is recorded per `output_stride` accepted steps.
//! - Observers run once per accepted step; detected events pass through
//!   `EventHandling`.
//! - Cancellation is checked between steps, never inside one.

pub mod clock;
pub mod observers;
pub mod rules;
pub mod state;

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

pub use clock::{SimClock, StepAdjustment};
pub use observers::{
    DetectedEvent, EventDetector, EventKind, MonitorRecord, StateMonitor, StepObserver,
    StepRecord,
};
pub use rules::{DomainRule, PhysicsCharacter};
pub use state::{EnergyBreakdown, EntityState, Sample, TimeSeries, Vec3};

use crate::config::{SimulationConfig, SolverKind};
use crate::error::{SimError, SimResult};
use crate::ir::PhysicsIr;

/// Simulation time representation.
///
/// Fixed-point nanoseconds so timestamps are reproducible across runs and
/// platforms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SimTime {
    /// Time in nanoseconds from simulation start.
    nanos: u64,
}

impl SimTime {
    /// Zero time (simulation start).
    pub const ZERO: Self = Self { nanos: 0 };

    /// Create time from seconds, rounded to the nearest nanosecond.
    /// Negative and non-finite inputs map to zero.
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        if !(secs.is_finite() && secs > 0.0) {
            return Self::ZERO;
        }
        Self {
            nanos: (secs * 1_000_000_000.0).round() as u64,
        }
    }

    /// Create time from nanoseconds.
    #[must_use]
    pub const fn from_nanos(nanos: u64) -> Self {
        Self { nanos }
    }

    /// Get time as seconds (f64).
    #[must_use]
    pub fn as_secs_f64(&self) -> f64 {
        self.nanos as f64 / 1_000_000_000.0
    }

    /// Get time as nanoseconds.
    #[must_use]
    pub const fn as_nanos(&self) -> u64 {
        self.nanos
    }

    /// Add duration to time.
    #[must_use]
    pub const fn add_nanos(self, nanos: u64) -> Self {
        Self {
            nanos: self.nanos.saturating_add(nanos),
        }
    }
}

impl std::ops::Sub for SimTime {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            nanos: self.nanos.saturating_sub(rhs.nanos),
        }
    }
}

impl std::fmt::Display for SimTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.9}s", self.as_secs_f64())
    }
}

/// Shared cancellation flag, checked once per outer loop iteration.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Fresh, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    /// Building the initial sample.
    Initializing,
    /// Advancing time.
    Stepping,
    /// Observers reported events for the current step.
    EventHandling,
    /// Run covered its duration with enough successful steps.
    Completed,
    /// Run stopped or fell short of the success ratio.
    Failed,
}

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Reached the end time with an acceptable success ratio.
    Completed,
    /// Reached the end time, but too many attempts failed.
    Failed,
}

/// Step statistics of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    /// Accepted steps.
    pub accepted_steps: u64,
    /// Rejected attempts.
    pub failed_steps: u64,
    /// Accepted / total.
    pub success_ratio: f64,
    /// Smallest full-size step taken (s).
    pub min_step: f64,
    /// Largest full-size step taken (s).
    pub max_step: f64,
    /// Simulation time reached (s).
    pub final_time: f64,
    /// Solver tag the run was configured with.
    pub solver: SolverKind,
}

impl RunStats {
    /// Largest over smallest observed step.
    #[must_use]
    pub fn step_ratio(&self) -> f64 {
        if self.min_step > 0.0 {
            self.max_step / self.min_step
        } else {
            1.0
        }
    }
}

/// Output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    /// Completed or failed.
    pub status: RunStatus,
    /// Dispatched physics character.
    pub character: PhysicsCharacter,
    /// Recorded samples.
    pub series: TimeSeries,
    /// Step statistics.
    pub stats: RunStats,
    /// Detected events.
    pub events: Vec<DetectedEvent>,
    /// Per-step energy and step-size log.
    pub monitor: Vec<MonitorRecord>,
    /// Accumulated warnings and failure reasons.
    pub messages: Vec<String>,
}

impl SimulationRun {
    /// Whether the run completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Main simulation engine.
pub struct SimEngine {
    config: SimulationConfig,
    rule: DomainRule,
    clock: SimClock,
    entities: Vec<EntityState>,
    series: TimeSeries,
    phase: EnginePhase,
    detector: EventDetector,
    monitor: StateMonitor,
    observers: Vec<Box<dyn StepObserver>>,
    cancel: CancellationToken,
    messages: Vec<String>,
}

impl std::fmt::Debug for SimEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEngine")
            .field("rule", &self.rule)
            .field("phase", &self.phase)
            .field("time", &self.clock.current_time())
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}

impl SimEngine {
    /// Engine for an IR, using the IR's simulation section.
    ///
    /// # Errors
    ///
    /// Returns error if the simulation section fails validation.
    pub fn new(ir: &PhysicsIr) -> SimResult<Self> {
        Self::with_config(ir, ir.simulation_config())
    }

    /// Engine for an IR with an explicit simulation configuration.
    ///
    /// # Errors
    ///
    /// Returns error if `config` fails schema or semantic validation.
    pub fn with_config(ir: &PhysicsIr, config: SimulationConfig) -> SimResult<Self> {
        config.validate_for_run()?;
        let rule = DomainRule::from_ir(ir);
        let entities = ir
            .entities
            .iter()
            .map(|e| EntityState::from_entity(e, ir))
            .collect();
        Ok(Self {
            clock: SimClock::new(&config),
            config,
            rule,
            entities,
            series: TimeSeries::new(),
            phase: EnginePhase::Initializing,
            detector: EventDetector::new(),
            monitor: StateMonitor::new(),
            observers: Vec::new(),
            cancel: CancellationToken::new(),
            messages: Vec::new(),
        })
    }

    /// Use a shared cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Register an additional observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Box<dyn StepObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Rule the engine dispatches to.
    #[must_use]
    pub const fn rule(&self) -> &DomainRule {
        &self.rule
    }

    /// Current entity states.
    #[must_use]
    pub fn entities(&self) -> &[EntityState] {
        &self.entities
    }

    /// Run to the configured duration.
    ///
    /// # Errors
    ///
    /// - `StepCollapse` if halving a non-finite step goes below the floor
    /// - `IterationCap` if the attempt cap is reached first
    /// - `Cancelled` if the token is cancelled between steps
    pub fn run(mut self) -> SimResult<SimulationRun> {
        match self.run_loop() {
            Ok(()) => Ok(self.finish()),
            Err(e) => {
                self.phase = EnginePhase::Failed;
                warn!(error = %e, phase = ?self.phase, "simulation stopped");
                Err(e)
            }
        }
    }

    fn record_sample(&mut self) -> SimResult<()> {
        let energy = self.rule.energy(&self.entities);
        let time = self.clock.current_time().as_secs_f64();
        self.series
            .push(Sample::new(time, self.entities.clone(), energy))
    }

    fn run_loop(&mut self) -> SimResult<()> {
        self.phase = EnginePhase::Initializing;
        self.record_sample()?;
        info!(
            character = %self.rule.character(),
            entities = self.entities.len(),
            duration = self.config.duration,
            time_step = self.config.time_step,
            "simulation started"
        );

        self.phase = EnginePhase::Stepping;
        let end = SimTime::from_secs(self.config.duration);
        let stride = self.config.output_stride.max(1);
        let mut since_sample = 0usize;

        while self.clock.current_time() < end {
            if self.cancel.is_cancelled() {
                return Err(SimError::Cancelled {
                    time: self.clock.current_time().as_secs_f64(),
                });
            }

            let (next, taken) = self.attempt_step(end)?;
            let error = velocity_change(&self.entities, &next);
            let adjustment = self.clock.accept(taken, error);
            if adjustment != StepAdjustment::Unchanged {
                trace!(
                    ?adjustment,
                    error,
                    step = self.clock.step_secs(),
                    "step size adapted"
                );
            }

            let step = SimTime::from_nanos(taken).as_secs_f64();
            let energy = self.rule.energy(&next);
            let record = StepRecord {
                time: self.clock.current_time().as_secs_f64(),
                step,
                previous: &self.entities,
                current: &next,
                energy,
            };
            let mut events = self.detector.observe(&record);
            self.monitor.observe(&record);
            for observer in &mut self.observers {
                events += observer.observe(&record);
            }
            if events > 0 {
                self.phase = EnginePhase::EventHandling;
                debug!(events, time = record.time, "events detected");
            }
            self.entities = next;
            self.phase = EnginePhase::Stepping;

            since_sample += 1;
            if since_sample == stride || self.clock.current_time() >= end {
                self.record_sample()?;
                since_sample = 0;
            }
        }
        Ok(())
    }

    /// Try steps until one produces a finite state, halving on failure.
    fn attempt_step(&mut self, end: SimTime) -> SimResult<(Vec<EntityState>, u64)> {
        let time = self.clock.current_time().as_secs_f64();
        loop {
            if self.clock.total_steps() >= self.config.max_iterations {
                return Err(SimError::IterationCap {
                    iterations: self.config.max_iterations,
                });
            }
            let taken = self.clock.next_step(end);
            let dt = SimTime::from_nanos(taken).as_secs_f64();
            let next = self.rule.advance(&self.entities, time, dt);
            if next.iter().all(EntityState::is_finite) {
                return Ok((next, taken));
            }
            let halved = self.clock.reject()?;
            let message = format!(
                "non-finite state at t={time:.6}s with step {dt:.3e}s, retrying at {:.3e}s",
                SimTime::from_nanos(halved).as_secs_f64()
            );
            warn!(time, step = dt, "non-finite step, halving");
            self.messages.push(message);
        }
    }

    fn finish(mut self) -> SimulationRun {
        let ratio = self.clock.success_ratio();
        let status = if ratio >= self.config.min_success_ratio {
            self.phase = EnginePhase::Completed;
            RunStatus::Completed
        } else {
            self.phase = EnginePhase::Failed;
            self.messages.push(format!(
                "success ratio {ratio:.3} below required {:.3}",
                self.config.min_success_ratio
            ));
            RunStatus::Failed
        };

        let (min_step, max_step) = self
            .clock
            .observed_step_range()
            .unwrap_or((self.clock.step_secs(), self.clock.step_secs()));
        let stats = RunStats {
            accepted_steps: self.clock.accepted_steps(),
            failed_steps: self.clock.failed_steps(),
            success_ratio: ratio,
            min_step,
            max_step,
            final_time: self.clock.current_time().as_secs_f64(),
            solver: self.config.solver,
        };
        info!(
            status = ?status,
            samples = self.series.len(),
            accepted = stats.accepted_steps,
            failed = stats.failed_steps,
            final_time = stats.final_time,
            "simulation finished"
        );

        SimulationRun {
            status,
            character: self.rule.character(),
            series: self.series,
            stats,
            events: self.detector.into_events(),
            monitor: self.monitor.into_records(),
            messages: self.messages,
        }
    }
}

/// Aggregate velocity-change magnitude between two entity sets; the
/// adaptive error estimate.
#[must_use]
pub fn velocity_change(previous: &[EntityState], next: &[EntityState]) -> f64 {
    previous
        .iter()
        .zip(next)
        .map(|(a, b)| (b.velocity - a.velocity).magnitude())
        .sum()
}
