//! Per-step observers.
//!
//! Observers see every accepted step and keep their own logs; they never
//! touch the trajectory.

use serde::{Deserialize, Serialize};

use super::state::{EnergyBreakdown, EntityState};

/// View of one accepted step.
#[derive(Debug, Clone, Copy)]
pub struct StepRecord<'a> {
    /// Time at the end of the step (s).
    pub time: f64,
    /// Step size (s).
    pub step: f64,
    /// Entities before the step.
    pub previous: &'a [EntityState],
    /// Entities after the step.
    pub current: &'a [EntityState],
    /// Energy after the step.
    pub energy: EnergyBreakdown,
}

/// Hook run once per accepted step.
pub trait StepObserver: Send {
    /// Observer name for logs.
    fn name(&self) -> &'static str;

    /// Inspect a step. Returns the number of events recorded.
    fn observe(&mut self, record: &StepRecord<'_>) -> usize;
}

/// Kind of detected event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Entity reached the ground from above.
    GroundContact,
    /// Vertical velocity changed sign from up to down (apex).
    TurningPoint,
    /// X position crossed zero.
    ZeroCrossing,
}

/// One detected event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    /// Event time (s), interpolated within the step where possible.
    pub time: f64,
    /// Entity id.
    pub entity: String,
    /// Event kind.
    pub kind: EventKind,
}

/// Detects ground contacts, turning points and zero crossings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDetector {
    events: Vec<DetectedEvent>,
}

impl EventDetector {
    /// Empty detector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events so far.
    #[must_use]
    pub fn events(&self) -> &[DetectedEvent] {
        &self.events
    }

    /// Take the event log.
    #[must_use]
    pub fn into_events(self) -> Vec<DetectedEvent> {
        self.events
    }
}

/// Time at which a quantity going from `a` to `b` over the step crosses
/// zero.
fn crossing_time(start: f64, step: f64, a: f64, b: f64) -> f64 {
    if (a - b).abs() < f64::EPSILON {
        start + step
    } else {
        start + step * a / (a - b)
    }
}

impl StepObserver for EventDetector {
    fn name(&self) -> &'static str {
        "event_detector"
    }

    fn observe(&mut self, record: &StepRecord<'_>) -> usize {
        let before = self.events.len();
        let start = record.time - record.step;
        for (prev, cur) in record.previous.iter().zip(record.current) {
            let mut push = |time: f64, kind: EventKind| {
                self.events.push(DetectedEvent {
                    time,
                    entity: cur.id.clone(),
                    kind,
                });
            };
            if prev.position.y > 0.0 && cur.position.y <= 0.0 {
                push(record.time, EventKind::GroundContact);
            }
            if prev.velocity.y > 0.0 && cur.velocity.y <= 0.0 {
                push(
                    crossing_time(start, record.step, prev.velocity.y, cur.velocity.y),
                    EventKind::TurningPoint,
                );
            }
            let (a, b) = (prev.position.x, cur.position.x);
            if (a > 0.0 && b <= 0.0) || (a < 0.0 && b >= 0.0) {
                push(crossing_time(start, record.step, a, b), EventKind::ZeroCrossing);
            }
        }
        self.events.len() - before
    }
}

/// One state-monitor entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorRecord {
    /// Time at the end of the step (s).
    pub time: f64,
    /// Step size (s).
    pub step: f64,
    /// Total energy after the step (J).
    pub total_energy: f64,
}

/// Logs energy and step size for every step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateMonitor {
    records: Vec<MonitorRecord>,
}

impl StateMonitor {
    /// Empty monitor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records so far.
    #[must_use]
    pub fn records(&self) -> &[MonitorRecord] {
        &self.records
    }

    /// Take the log.
    #[must_use]
    pub fn into_records(self) -> Vec<MonitorRecord> {
        self.records
    }

    /// Largest relative deviation of total energy from the first record.
    #[must_use]
    pub fn max_energy_drift(&self) -> f64 {
        let Some(first) = self.records.first() else {
            return 0.0;
        };
        let scale = first.total_energy.abs().max(f64::EPSILON);
        self.records
            .iter()
            .map(|r| (r.total_energy - first.total_energy).abs() / scale)
            .fold(0.0, f64::max)
    }
}

impl StepObserver for StateMonitor {
    fn name(&self) -> &'static str {
        "state_monitor"
    }

    fn observe(&mut self, record: &StepRecord<'_>) -> usize {
        self.records.push(MonitorRecord {
            time: record.time,
            step: record.step,
            total_energy: record.energy.total,
        });
        0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::state::Vec3;

    fn at(x: f64, y: f64, vy: f64) -> EntityState {
        EntityState {
            id: "p".into(),
            position: Vec3::new(x, y, 0.0),
            velocity: Vec3::new(0.0, vy, 0.0),
            acceleration: Vec3::zero(),
            mass: 1.0,
            charge: 0.0,
            temperature: None,
        }
    }

    fn record<'a>(prev: &'a [EntityState], cur: &'a [EntityState]) -> StepRecord<'a> {
        StepRecord {
            time: 1.0,
            step: 0.1,
            previous: prev,
            current: cur,
            energy: EnergyBreakdown::new(1.0, 2.0),
        }
    }

    #[test]
    fn test_zero_crossing_interpolated() {
        let mut detector = EventDetector::new();
        let prev = [at(0.3, 1.0, 0.0)];
        let cur = [at(-0.1, 1.0, 0.0)];
        assert_eq!(detector.observe(&record(&prev, &cur)), 1);
        let event = &detector.events()[0];
        assert_eq!(event.kind, EventKind::ZeroCrossing);
        // 0.9 + 0.1 * 0.3 / 0.4
        assert!((event.time - 0.975).abs() < 1e-12);
    }

    #[test]
    fn test_ground_contact_and_apex() {
        let mut detector = EventDetector::new();
        let prev = [at(0.0, 0.5, 1.0)];
        let cur = [at(0.0, 0.0, -1.0)];
        detector.observe(&record(&prev, &cur));
        let kinds: Vec<EventKind> = detector.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![EventKind::GroundContact, EventKind::TurningPoint]);
    }

    #[test]
    fn test_no_events_at_rest() {
        let mut detector = EventDetector::new();
        let state = [at(0.0, 0.0, 0.0)];
        assert_eq!(detector.observe(&record(&state, &state)), 0);
    }

    #[test]
    fn test_state_monitor_drift() {
        let mut monitor = StateMonitor::new();
        let state = [at(0.0, 0.0, 0.0)];
        monitor.observe(&record(&state, &state));
        let mut second = record(&state, &state);
        second.energy = EnergyBreakdown::new(1.0, 2.03);
        monitor.observe(&second);
        assert_eq!(monitor.records().len(), 2);
        assert!((monitor.max_energy_drift() - 0.01).abs() < 1e-9);
    }
}
