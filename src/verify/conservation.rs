//! Conservation checks: first sample against last.

use serde::{Deserialize, Serialize};

use crate::config::ResultThresholds;
use crate::engine::{Sample, TimeSeries, Vec3};
use crate::ir::{ConservationKind, ConservationLaw};

/// Below this magnitude a quantity counts as zero and drift is absolute.
const ZERO_SCALE: f64 = 1e-12;

/// Outcome of one conservation check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationCheck {
    /// Conserved quantity.
    pub kind: ConservationKind,
    /// Magnitude at the first sample.
    pub initial: f64,
    /// Magnitude at the last sample.
    pub final_value: f64,
    /// Relative deviation.
    pub deviation: f64,
    /// Allowed relative deviation.
    pub tolerance: f64,
    /// Deviation within tolerance.
    pub passed: bool,
}

/// Relative change from `initial` given the size of the change; absolute
/// when the initial value is zero.
#[must_use]
pub fn relative_deviation(initial: f64, change: f64) -> f64 {
    if initial.abs() > ZERO_SCALE {
        change.abs() / initial.abs()
    } else {
        change.abs()
    }
}

fn vector_of(kind: ConservationKind, sample: &Sample) -> Vec3 {
    match kind {
        ConservationKind::Energy => Vec3::new(sample.energy.total, 0.0, 0.0),
        ConservationKind::Momentum => sample.momentum,
        ConservationKind::AngularMomentum => sample.angular_momentum,
        ConservationKind::Charge => Vec3::new(sample.total_charge, 0.0, 0.0),
        ConservationKind::Mass => Vec3::new(sample.total_mass, 0.0, 0.0),
        ConservationKind::ParticleCount => Vec3::new(sample.entities.len() as f64, 0.0, 0.0),
    }
}

fn tolerance_for(law: &ConservationLaw, thresholds: &ResultThresholds) -> f64 {
    match law.kind {
        ConservationKind::Energy => thresholds.energy_tolerance,
        ConservationKind::Momentum => thresholds.momentum_tolerance,
        ConservationKind::AngularMomentum => thresholds.angular_momentum_tolerance,
        ConservationKind::Mass => thresholds.mass_tolerance,
        ConservationKind::Charge | ConservationKind::ParticleCount => law.tolerance,
    }
}

/// Check one law between two samples.
#[must_use]
pub fn check_law(
    law: &ConservationLaw,
    first: &Sample,
    last: &Sample,
    thresholds: &ResultThresholds,
) -> ConservationCheck {
    let a = vector_of(law.kind, first);
    let b = vector_of(law.kind, last);
    // Scalars are carried in x so their sign survives.
    let scalar = matches!(
        law.kind,
        ConservationKind::Energy
            | ConservationKind::Charge
            | ConservationKind::Mass
            | ConservationKind::ParticleCount
    );
    let (initial, final_value) = if scalar {
        (a.x, b.x)
    } else {
        (a.magnitude(), b.magnitude())
    };
    let deviation = relative_deviation(a.magnitude(), (b - a).magnitude());
    let tolerance = tolerance_for(law, thresholds);

    ConservationCheck {
        kind: law.kind,
        initial,
        final_value,
        deviation,
        tolerance,
        passed: deviation <= tolerance,
    }
}

/// Check every declared law across a series. Nothing is checked when the
/// series is empty.
#[must_use]
pub fn check_laws(
    laws: &[ConservationLaw],
    series: &TimeSeries,
    thresholds: &ResultThresholds,
) -> Vec<ConservationCheck> {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return Vec::new();
    };
    let mut seen: Vec<ConservationKind> = Vec::new();
    laws.iter()
        .filter(|law| {
            let fresh = !seen.contains(&law.kind);
            seen.push(law.kind);
            fresh
        })
        .map(|law| check_law(law, first, last, thresholds))
        .collect()
}
