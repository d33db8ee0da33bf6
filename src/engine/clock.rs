//! Simulation clock with adaptive step control.
//!
//! Time is kept in integer nanoseconds ([`SimTime`]) so repeated runs land
//! on identical timestamps. The step size adapts to a per-step error
//! estimate:
//! - error > 2 × tolerance: shrink by `shrink_factor`, not below the floor
//! - error < 0.5 × tolerance: grow by `growth_factor`, not above the ceiling
//! - otherwise unchanged
//!
//! A rejected (non-finite) step halves the step size; halving below the
//! floor is a step collapse.

use serde::{Deserialize, Serialize};

use crate::config::SimulationConfig;
use crate::engine::SimTime;
use crate::error::{SimError, SimResult};

/// What the controller did after an accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAdjustment {
    /// Step size reduced.
    Shrunk,
    /// Step size increased.
    Grown,
    /// Step size kept.
    Unchanged,
}

/// Simulation clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// Current simulation time.
    current: SimTime,
    /// Nominal step in nanoseconds.
    step_nanos: u64,
    /// Step floor in nanoseconds.
    min_nanos: u64,
    /// Step ceiling in nanoseconds.
    max_nanos: u64,
    adaptive: bool,
    tolerance: f64,
    shrink_factor: f64,
    growth_factor: f64,
    accepted: u64,
    failed: u64,
    /// Smallest and largest full-size step actually taken.
    observed: Option<(u64, u64)>,
}

fn to_nanos(secs: f64) -> u64 {
    SimTime::from_secs(secs).as_nanos().max(1)
}

fn scale_nanos(nanos: u64, factor: f64) -> u64 {
    ((nanos as f64) * factor).round().max(1.0) as u64
}

impl SimClock {
    /// Clock for a run configuration.
    #[must_use]
    pub fn new(config: &SimulationConfig) -> Self {
        let base = to_nanos(config.time_step);
        let (min_nanos, max_nanos) = if config.adaptive_stepping {
            let min = to_nanos(config.min_time_step);
            (min, to_nanos(config.max_time_step).max(min))
        } else {
            // Fixed stepping never grows; retries may still halve down to
            // the configured floor.
            (to_nanos(config.min_time_step).min(base), base)
        };

        Self {
            current: SimTime::ZERO,
            step_nanos: base.clamp(min_nanos, max_nanos),
            min_nanos,
            max_nanos,
            adaptive: config.adaptive_stepping,
            tolerance: config.tolerance,
            shrink_factor: config.shrink_factor,
            growth_factor: config.growth_factor,
            accepted: 0,
            failed: 0,
            observed: None,
        }
    }

    /// Current simulation time.
    #[must_use]
    pub const fn current_time(&self) -> SimTime {
        self.current
    }

    /// Nominal step size in seconds.
    #[must_use]
    pub fn step_secs(&self) -> f64 {
        SimTime::from_nanos(self.step_nanos).as_secs_f64()
    }

    /// Nominal step size in nanoseconds.
    #[must_use]
    pub const fn step_nanos(&self) -> u64 {
        self.step_nanos
    }

    /// Step floor in seconds.
    #[must_use]
    pub fn min_step_secs(&self) -> f64 {
        SimTime::from_nanos(self.min_nanos).as_secs_f64()
    }

    /// Step ceiling in seconds.
    #[must_use]
    pub fn max_step_secs(&self) -> f64 {
        SimTime::from_nanos(self.max_nanos).as_secs_f64()
    }

    /// Size of the next attempt: the nominal step, truncated so the run
    /// ends exactly at `end`.
    #[must_use]
    pub fn next_step(&self, end: SimTime) -> u64 {
        self.step_nanos.min((end - self.current).as_nanos())
    }

    /// Commit an accepted step of `taken` nanoseconds whose error estimate
    /// was `error`, then adapt the nominal step.
    pub fn accept(&mut self, taken: u64, error: f64) -> StepAdjustment {
        self.current = self.current.add_nanos(taken);
        self.accepted += 1;
        if taken == self.step_nanos {
            self.observed = Some(match self.observed {
                Some((lo, hi)) => (lo.min(taken), hi.max(taken)),
                None => (taken, taken),
            });
        }

        if !self.adaptive || !error.is_finite() {
            return StepAdjustment::Unchanged;
        }
        if error > 2.0 * self.tolerance && self.step_nanos > self.min_nanos {
            self.step_nanos = scale_nanos(self.step_nanos, self.shrink_factor).max(self.min_nanos);
            StepAdjustment::Shrunk
        } else if error < 0.5 * self.tolerance && self.step_nanos < self.max_nanos {
            self.step_nanos = scale_nanos(self.step_nanos, self.growth_factor).min(self.max_nanos);
            StepAdjustment::Grown
        } else {
            StepAdjustment::Unchanged
        }
    }

    /// Record a failed attempt and halve the step.
    ///
    /// # Errors
    ///
    /// Returns `StepCollapse` when the halved step falls below the floor.
    pub fn reject(&mut self) -> SimResult<u64> {
        self.failed += 1;
        let halved = self.step_nanos / 2;
        if halved < self.min_nanos {
            return Err(SimError::StepCollapse {
                time: self.current.as_secs_f64(),
                step: SimTime::from_nanos(halved).as_secs_f64(),
            });
        }
        self.step_nanos = halved;
        Ok(halved)
    }

    /// Accepted steps.
    #[must_use]
    pub const fn accepted_steps(&self) -> u64 {
        self.accepted
    }

    /// Failed attempts.
    #[must_use]
    pub const fn failed_steps(&self) -> u64 {
        self.failed
    }

    /// Accepted plus failed.
    #[must_use]
    pub const fn total_steps(&self) -> u64 {
        self.accepted + self.failed
    }

    /// Accepted / total; 1.0 before any attempt.
    #[must_use]
    pub fn success_ratio(&self) -> f64 {
        match self.total_steps() {
            0 => 1.0,
            total => self.accepted as f64 / total as f64,
        }
    }

    /// Smallest and largest full-size step taken, in seconds.
    #[must_use]
    pub fn observed_step_range(&self) -> Option<(f64, f64)> {
        self.observed.map(|(lo, hi)| {
            (
                SimTime::from_nanos(lo).as_secs_f64(),
                SimTime::from_nanos(hi).as_secs_f64(),
            )
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn adaptive() -> SimulationConfig {
        SimulationConfig {
            time_step: 0.001,
            min_time_step: 1e-5,
            max_time_step: 0.01,
            tolerance: 0.01,
            adaptive_stepping: true,
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn test_clock_creation() {
        let clock = SimClock::new(&adaptive());
        assert_eq!(clock.current_time(), SimTime::ZERO);
        assert_eq!(clock.step_nanos(), 1_000_000);
        assert_eq!(clock.total_steps(), 0);
        assert!((clock.success_ratio() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_accept_advances_time() {
        let mut clock = SimClock::new(&adaptive());
        clock.accept(1_000_000, 0.01);
        clock.accept(1_000_000, 0.01);
        assert_eq!(clock.accepted_steps(), 2);
        assert!((clock.current_time().as_secs_f64() - 0.002).abs() < 1e-12);
    }

    #[test]
    fn test_shrink_and_grow() {
        let mut clock = SimClock::new(&adaptive());
        assert_eq!(clock.accept(1_000_000, 0.05), StepAdjustment::Shrunk);
        assert_eq!(clock.step_nanos(), 800_000);
        assert_eq!(clock.accept(800_000, 0.001), StepAdjustment::Grown);
        assert_eq!(clock.step_nanos(), 960_000);
        assert_eq!(clock.accept(960_000, 0.01), StepAdjustment::Unchanged);
    }

    #[test]
    fn test_fixed_step_never_adapts() {
        let config = SimulationConfig {
            adaptive_stepping: false,
            ..adaptive()
        };
        let mut clock = SimClock::new(&config);
        assert_eq!(clock.accept(1_000_000, 100.0), StepAdjustment::Unchanged);
        assert_eq!(clock.step_nanos(), 1_000_000);
    }

    #[test]
    fn test_next_step_truncates_at_end() {
        let mut clock = SimClock::new(&adaptive());
        let end = SimTime::from_secs(0.0025);
        clock.accept(1_000_000, 0.01);
        clock.accept(1_000_000, 0.01);
        assert_eq!(clock.next_step(end), 500_000);
        clock.accept(500_000, 0.01);
        assert_eq!(clock.current_time(), end);
        // Truncated step is not an observed step size.
        assert_eq!(clock.observed_step_range(), Some((0.001, 0.001)));
    }

    #[test]
    fn test_reject_halves_then_collapses() {
        let config = SimulationConfig {
            min_time_step: 0.0004,
            ..adaptive()
        };
        let mut clock = SimClock::new(&config);
        assert_eq!(clock.reject().unwrap(), 500_000);
        let err = clock.reject().unwrap_err();
        assert!(matches!(err, SimError::StepCollapse { .. }));
        assert!(err.is_fatal_step_failure());
        assert_eq!(clock.failed_steps(), 2);
        assert!(clock.success_ratio().abs() < f64::EPSILON);
    }
}
