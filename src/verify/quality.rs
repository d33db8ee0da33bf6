//! Data-quality analysis of a recorded series.
//!
//! Scores the trajectory itself, independent of any physics law:
//! completeness, continuity between samples, smoothness of the estimated
//! acceleration, outliers in per-entity speed and sample-to-sample noise.

use serde::{Deserialize, Serialize};

use crate::config::ResultThresholds;
use crate::engine::{EntityState, Sample, TimeSeries};

/// Absolute slack on the continuity bound (m).
const DISPLACEMENT_SLACK: f64 = 1e-9;

/// Weights of the aggregated score.
const CONTINUITY_WEIGHT: f64 = 0.3;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const OUTLIER_WEIGHT: f64 = 0.2;
const COMPLETENESS_WEIGHT: f64 = 0.2;

/// Data-quality summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    /// Entity records absent from a sample (relative to the first sample).
    pub missing_fields: usize,
    /// Non-finite position, velocity or energy values.
    pub corrupted_fields: usize,
    /// Fraction of consecutive pairs within the velocity-implied bound.
    pub continuity: f64,
    /// Fraction of consecutive triples with a smooth acceleration estimate.
    pub consistency: f64,
    /// Fraction of speed values beyond the sigma band.
    pub outlier_ratio: f64,
    /// Mean inter-sample velocity change (m/s).
    pub noise_level: f64,
    /// Aggregated score in [0, 1].
    pub score: f64,
    /// Human-readable advice.
    pub recommendations: Vec<String>,
}

impl DataQuality {
    fn empty() -> Self {
        Self {
            missing_fields: 0,
            corrupted_fields: 0,
            continuity: 0.0,
            consistency: 0.0,
            outlier_ratio: 0.0,
            noise_level: 0.0,
            score: 0.0,
            recommendations: vec!["No samples recorded; nothing to assess".to_string()],
        }
    }
}

/// Maximum displacement allowed between two samples of one entity.
#[must_use]
pub fn displacement_bound(prev: &EntityState, next: &EntityState, dt: f64, factor: f64) -> f64 {
    let speed = prev.velocity.magnitude().max(next.velocity.magnitude());
    factor * speed * dt + DISPLACEMENT_SLACK
}

/// Fraction helper: 1.0 when nothing was checked.
fn fraction(good: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        good as f64 / total as f64
    }
}

/// Pairs each entity of `a` with the same id in `b`.
fn matched<'a>(a: &'a Sample, b: &'a Sample) -> impl Iterator<Item = (&'a EntityState, &'a EntityState)> {
    a.entities
        .iter()
        .filter_map(move |e| b.entity(&e.id).map(|other| (e, other)))
}

fn count_corrupted(samples: &[Sample]) -> usize {
    samples
        .iter()
        .map(|s| {
            let entity_faults: usize = s
                .entities
                .iter()
                .map(|e| usize::from(!e.position.is_finite()) + usize::from(!e.velocity.is_finite()))
                .sum();
            entity_faults + usize::from(!s.energy.total.is_finite())
        })
        .sum()
}

fn count_missing(samples: &[Sample]) -> usize {
    let Some(first) = samples.first() else {
        return 0;
    };
    samples
        .iter()
        .map(|s| first.entities.iter().filter(|e| s.entity(&e.id).is_none()).count())
        .sum()
}

fn continuity(samples: &[Sample], factor: f64) -> f64 {
    let (mut good, mut total) = (0, 0);
    for pair in samples.windows(2) {
        let dt = pair[1].time - pair[0].time;
        for (prev, next) in matched(&pair[0], &pair[1]) {
            total += 1;
            let moved = (next.position - prev.position).magnitude();
            if moved <= displacement_bound(prev, next, dt, factor) {
                good += 1;
            }
        }
    }
    fraction(good, total)
}

fn consistency(samples: &[Sample], thresholds: &ResultThresholds) -> f64 {
    let (mut good, mut total) = (0, 0);
    for triple in samples.windows(3) {
        let dt1 = triple[1].time - triple[0].time;
        let dt2 = triple[2].time - triple[1].time;
        if dt1 <= 0.0 || dt2 <= 0.0 {
            continue;
        }
        for e0 in &triple[0].entities {
            let (Some(e1), Some(e2)) = (triple[1].entity(&e0.id), triple[2].entity(&e0.id)) else {
                continue;
            };
            total += 1;
            let a1 = (e1.velocity - e0.velocity).scale(1.0 / dt1);
            let a2 = (e2.velocity - e1.velocity).scale(1.0 / dt2);
            let jump = (a2 - a1).magnitude();
            let allowed = (thresholds.smoothness_tolerance * a1.magnitude().max(a2.magnitude()))
                .max(thresholds.smoothness_floor);
            if jump <= allowed {
                good += 1;
            }
        }
    }
    fraction(good, total)
}

/// Returns (outlier count, speed count).
fn outliers(samples: &[Sample], sigma: f64) -> (usize, usize) {
    let Some(first) = samples.first() else {
        return (0, 0);
    };
    let (mut flagged, mut total) = (0, 0);
    for entity in &first.entities {
        let speeds: Vec<f64> = samples
            .iter()
            .filter_map(|s| s.entity(&entity.id))
            .map(|e| e.velocity.magnitude())
            .filter(|v| v.is_finite())
            .collect();
        total += speeds.len();
        if speeds.len() < 3 {
            continue;
        }
        let n = speeds.len() as f64;
        let mean = speeds.iter().sum::<f64>() / n;
        let std = (speeds.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        if std <= f64::EPSILON {
            continue;
        }
        flagged += speeds.iter().filter(|v| (*v - mean).abs() > sigma * std).count();
    }
    (flagged, total)
}

fn noise(samples: &[Sample]) -> f64 {
    let deltas: Vec<f64> = samples
        .windows(2)
        .flat_map(|pair| {
            matched(&pair[0], &pair[1])
                .map(|(a, b)| (b.velocity - a.velocity).magnitude())
                .collect::<Vec<_>>()
        })
        .filter(|d| d.is_finite())
        .collect();
    if deltas.is_empty() {
        0.0
    } else {
        deltas.iter().sum::<f64>() / deltas.len() as f64
    }
}

/// Analyse a series.
#[must_use]
pub fn analyze(series: &TimeSeries, thresholds: &ResultThresholds) -> DataQuality {
    let samples = series.samples();
    let Some(first) = samples.first() else {
        return DataQuality::empty();
    };

    let missing_fields = count_missing(samples);
    let corrupted_fields = count_corrupted(samples);
    // Two vector fields per entity record plus one energy value per sample.
    let expected = samples.len() * (2 * first.entities.len() + 1);
    let completeness =
        (1.0 - (2 * missing_fields + corrupted_fields) as f64 / expected as f64).clamp(0.0, 1.0);

    let continuity = continuity(samples, thresholds.causality_factor);
    let consistency = consistency(samples, thresholds);
    let (flagged, speeds) = outliers(samples, thresholds.outlier_sigma);
    let outlier_ratio = if speeds == 0 { 0.0 } else { flagged as f64 / speeds as f64 };
    let noise_level = noise(samples);

    let score = CONTINUITY_WEIGHT * continuity
        + CONSISTENCY_WEIGHT * consistency
        + OUTLIER_WEIGHT * (1.0 - outlier_ratio)
        + COMPLETENESS_WEIGHT * completeness;

    let mut recommendations = Vec::new();
    if missing_fields > 0 {
        recommendations.push(format!("{missing_fields} entity records missing; check entity ids are stable"));
    }
    if corrupted_fields > 0 {
        recommendations.push(format!(
            "{corrupted_fields} non-finite values; reduce the time step or check initial conditions"
        ));
    }
    if continuity < 0.95 {
        recommendations.push("Samples jump further than velocity allows; reduce the output stride".to_string());
    }
    if consistency < 0.9 {
        recommendations.push("Acceleration is not smooth between samples; reduce the time step".to_string());
    }
    if outlier_ratio > 0.05 {
        recommendations.push(format!(
            "{:.1}% of speed values are outliers; inspect collisions and constraints",
            outlier_ratio * 100.0
        ));
    }

    DataQuality {
        missing_fields,
        corrupted_fields,
        continuity,
        consistency,
        outlier_ratio,
        noise_level,
        score: score.clamp(0.0, 1.0),
        recommendations,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::engine::{EnergyBreakdown, Vec3};

    fn body(id: &str, y: f64, vy: f64) -> EntityState {
        EntityState {
            id: id.into(),
            position: Vec3::new(0.0, y, 0.0),
            velocity: Vec3::new(0.0, vy, 0.0),
            acceleration: Vec3::zero(),
            mass: 1.0,
            charge: 0.0,
            temperature: None,
        }
    }

    /// Free fall sampled every 0.1 s.
    fn free_fall(n: usize) -> TimeSeries {
        let mut series = TimeSeries::new();
        for i in 0..n {
            let t = i as f64 * 0.1;
            let e = body("p", 100.0 - 4.9 * t * t, -9.8 * t);
            series
                .push(Sample::new(t, vec![e], EnergyBreakdown::new(1.0, 1.0)))
                .unwrap();
        }
        series
    }

    #[test]
    fn test_smooth_series_scores_high() {
        let quality = analyze(&free_fall(20), &ResultThresholds::default());
        assert_eq!(quality.missing_fields, 0);
        assert_eq!(quality.corrupted_fields, 0);
        assert!((quality.continuity - 1.0).abs() < f64::EPSILON);
        assert!((quality.consistency - 1.0).abs() < f64::EPSILON);
        assert!(quality.outlier_ratio.abs() < f64::EPSILON);
        assert!((quality.noise_level - 0.98).abs() < 1e-9);
        assert!(quality.score > 0.99);
        assert!(quality.recommendations.is_empty());
    }

    #[test]
    fn test_teleport_breaks_continuity() {
        let mut series = TimeSeries::new();
        series
            .push(Sample::new(0.0, vec![body("p", 0.0, 1.0)], EnergyBreakdown::default()))
            .unwrap();
        series
            .push(Sample::new(0.1, vec![body("p", 50.0, 1.0)], EnergyBreakdown::default()))
            .unwrap();
        let quality = analyze(&series, &ResultThresholds::default());
        assert!(quality.continuity.abs() < f64::EPSILON);
        assert!(!quality.recommendations.is_empty());
    }

    #[test]
    fn test_missing_and_corrupted_counted() {
        let mut series = TimeSeries::new();
        series
            .push(Sample::new(
                0.0,
                vec![body("a", 1.0, 0.0), body("b", 1.0, 0.0)],
                EnergyBreakdown::default(),
            ))
            .unwrap();
        series
            .push(Sample::new(0.1, vec![body("a", f64::NAN, 0.0)], EnergyBreakdown::default()))
            .unwrap();
        let quality = analyze(&series, &ResultThresholds::default());
        assert_eq!(quality.missing_fields, 1);
        assert!(quality.corrupted_fields >= 1);
        assert!(quality.score < 1.0);
    }

    #[test]
    fn test_speed_spike_is_outlier() {
        let mut series = TimeSeries::new();
        for i in 0..30 {
            let t = f64::from(i) * 0.1;
            let vy = if i == 15 { 500.0 } else { 1.0 };
            series
                .push(Sample::new(t, vec![body("p", t, vy)], EnergyBreakdown::default()))
                .unwrap();
        }
        let quality = analyze(&series, &ResultThresholds::default());
        assert!(quality.outlier_ratio > 0.0);
        assert!(quality.consistency < 1.0);
    }

    #[test]
    fn test_empty_series() {
        let quality = analyze(&TimeSeries::new(), &ResultThresholds::default());
        assert!(quality.score.abs() < f64::EPSILON);
        assert_eq!(quality.recommendations.len(), 1);
    }
}
