//! Result verification.
//!
//! Scores a finished run: conservation of the laws the IR declares,
//! physical constraints, numerical stability, causality and data quality.
//! The outcome is a plain [`ResultReport`]; nothing here fails a run.
//!
//! The overall score is multiplicative: the conservation pass ratio times a
//! diminishing penalty `1 / (1 + w·n)` for each of constraint violations,
//! stability issues and causality violations.

pub mod conservation;
pub mod quality;

pub use conservation::{check_law, check_laws, relative_deviation, ConservationCheck};
pub use quality::{analyze, displacement_bound, DataQuality};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ResultThresholds;
use crate::engine::{SimulationRun, TimeSeries};
use crate::ir::PhysicsIr;

/// Category of a result issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    /// Physical constraint broken (speed ceiling, finite positions).
    Constraint,
    /// Numerical stability concern.
    Stability,
    /// Ordering or displacement artefact.
    Causality,
}

/// One issue found in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultIssue {
    /// Issue category.
    pub category: IssueCategory,
    /// Sample time (s), when tied to one.
    pub time: Option<f64>,
    /// Entity id, when tied to one.
    pub entity: Option<String>,
    /// Description.
    pub message: String,
}

impl ResultIssue {
    fn new(category: IssueCategory, message: impl Into<String>) -> Self {
        Self {
            category,
            time: None,
            entity: None,
            message: message.into(),
        }
    }

    fn at(mut self, time: f64, entity: &str) -> Self {
        self.time = Some(time);
        self.entity = Some(entity.to_string());
        self
    }
}

/// Verification report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultReport {
    /// One entry per declared conservation law.
    pub conservation: Vec<ConservationCheck>,
    /// Physical-constraint violations.
    pub constraint_violations: Vec<ResultIssue>,
    /// Numerical-stability issues.
    pub stability_issues: Vec<ResultIssue>,
    /// Causality violations.
    pub causality_violations: Vec<ResultIssue>,
    /// Hard errors; any one fails the run.
    pub errors: Vec<String>,
    /// Non-fatal observations.
    pub warnings: Vec<String>,
    /// Data-quality layer.
    pub data_quality: DataQuality,
    /// Overall score in [0, 1].
    pub score: f64,
    /// Score above threshold, no hard errors, run completed.
    pub success: bool,
}

impl ResultReport {
    /// Conservation checks that passed over those performed; 1.0 when none.
    #[must_use]
    pub fn conservation_ratio(&self) -> f64 {
        if self.conservation.is_empty() {
            return 1.0;
        }
        let passed = self.conservation.iter().filter(|c| c.passed).count();
        passed as f64 / self.conservation.len() as f64
    }
}

/// Diminishing penalty for `count` occurrences.
fn penalty(weight: f64, count: usize) -> f64 {
    1.0 / (1.0 + weight * count as f64)
}

/// Result validator.
#[derive(Debug, Clone, Default)]
pub struct ResultValidator {
    thresholds: ResultThresholds,
}

impl ResultValidator {
    /// Validator with the given thresholds.
    #[must_use]
    pub const fn new(thresholds: ResultThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in use.
    #[must_use]
    pub const fn thresholds(&self) -> &ResultThresholds {
        &self.thresholds
    }

    /// Verify a run of `ir`.
    #[must_use]
    pub fn validate(&self, ir: &PhysicsIr, run: &SimulationRun) -> ResultReport {
        let t = &self.thresholds;
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if !run.is_completed() {
            errors.push(format!("run did not complete: {}", run.messages.join("; ")));
        }

        let conservation = check_laws(&ir.conservation_laws, &run.series, t);
        for check in conservation.iter().filter(|c| !c.passed) {
            warnings.push(format!(
                "{} not conserved: deviation {:.4} exceeds {:.4}",
                check.kind, check.deviation, check.tolerance
            ));
        }

        let constraint_violations = self.constraints(&run.series);
        let (stability_issues, diverged) = self.stability(run);
        if diverged {
            errors.push("diverged: non-finite position or velocity".to_string());
        }
        for issue in stability_issues.iter().filter(|i| i.time.is_none()) {
            warnings.push(issue.message.clone());
        }

        let (causality_violations, out_of_order) = self.causality(&run.series);
        if out_of_order {
            errors.push("sample timestamps are not strictly increasing".to_string());
        }
        if !causality_violations.is_empty() {
            warnings.push(format!(
                "{} displacement(s) exceed the velocity-implied bound",
                causality_violations.len()
            ));
        }

        let data_quality = analyze(&run.series, t);
        let mut report = ResultReport {
            conservation,
            constraint_violations,
            stability_issues,
            causality_violations,
            errors,
            warnings,
            data_quality,
            score: 0.0,
            success: false,
        };

        report.score = report.conservation_ratio()
            * penalty(t.constraint_penalty, report.constraint_violations.len())
            * penalty(t.stability_penalty, report.stability_issues.len())
            * penalty(t.causality_penalty, report.causality_violations.len());
        report.success =
            run.is_completed() && report.errors.is_empty() && report.score >= t.success_score;

        debug!(
            conservation = report.conservation.len(),
            constraints = report.constraint_violations.len(),
            stability = report.stability_issues.len(),
            causality = report.causality_violations.len(),
            quality = report.data_quality.score,
            "result checks done"
        );
        info!(score = report.score, success = report.success, "results verified");
        report
    }

    fn constraints(&self, series: &TimeSeries) -> Vec<ResultIssue> {
        let mut issues = Vec::new();
        for sample in series.samples() {
            for e in &sample.entities {
                if !e.position.is_finite() {
                    issues.push(
                        ResultIssue::new(IssueCategory::Constraint, "position is not finite")
                            .at(sample.time, &e.id),
                    );
                    continue;
                }
                let speed = e.velocity.magnitude();
                if speed > self.thresholds.max_speed {
                    issues.push(
                        ResultIssue::new(
                            IssueCategory::Constraint,
                            format!(
                                "speed {speed:.3e} m/s exceeds ceiling {:.3e} m/s",
                                self.thresholds.max_speed
                            ),
                        )
                        .at(sample.time, &e.id),
                    );
                }
            }
        }
        issues
    }

    /// Returns the issues and whether the run diverged.
    fn stability(&self, run: &SimulationRun) -> (Vec<ResultIssue>, bool) {
        let mut issues = Vec::new();
        let ratio = run.stats.step_ratio();
        if ratio > self.thresholds.max_step_ratio {
            issues.push(ResultIssue::new(
                IssueCategory::Stability,
                format!(
                    "step ratio {ratio:.1} exceeds {:.1}; the step controller is oscillating",
                    self.thresholds.max_step_ratio
                ),
            ));
        }

        let mut diverged = false;
        for sample in run.series.samples() {
            for e in sample.entities.iter().filter(|e| !e.is_finite()) {
                diverged = true;
                issues.push(
                    ResultIssue::new(IssueCategory::Stability, "state diverged")
                        .at(sample.time, &e.id),
                );
            }
        }
        (issues, diverged)
    }

    /// Returns the issues and whether any timestamp failed to increase.
    fn causality(&self, series: &TimeSeries) -> (Vec<ResultIssue>, bool) {
        let mut issues = Vec::new();
        let mut out_of_order = false;
        for pair in series.samples().windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            let dt = next.time - prev.time;
            if dt <= 0.0 {
                out_of_order = true;
                issues.push(ResultIssue::new(
                    IssueCategory::Causality,
                    format!("timestamp {} does not follow {}", next.time, prev.time),
                ));
                continue;
            }
            for a in &prev.entities {
                let Some(b) = next.entity(&a.id) else {
                    continue;
                };
                let moved = (b.position - a.position).magnitude();
                let bound = displacement_bound(a, b, dt, self.thresholds.causality_factor);
                if moved > bound {
                    issues.push(
                        ResultIssue::new(
                            IssueCategory::Causality,
                            format!("moved {moved:.3e} m, bound {bound:.3e} m"),
                        )
                        .at(next.time, &a.id),
                    );
                }
            }
        }
        (issues, out_of_order)
    }
}
