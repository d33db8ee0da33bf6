//! Run configuration with YAML loading and validation.
//!
//! Mistakes in configuration are caught before a run starts through:
//! - Type-safe configuration structs
//! - Schema validation via `validator`
//! - Semantic validation (step bounds, step vs duration)
//!
//! Every empirical threshold used by the result validator lives in
//! [`ResultThresholds`] so it can be tuned per problem.

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::error::{SimError, SimResult};
use crate::units::SPEED_OF_LIGHT;

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Schema version for forward compatibility.
    #[validate(length(min = 1))]
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Simulation loop configuration.
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Output section copied into the IR.
    #[validate(nested)]
    #[serde(default)]
    pub output: OutputConfig,

    /// Post-run validation thresholds.
    #[validate(nested)]
    #[serde(default)]
    pub thresholds: ResultThresholds,
}

fn default_schema_version() -> String {
    "1.0".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            simulation: SimulationConfig::default(),
            output: OutputConfig::default(),
            thresholds: ResultThresholds::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        config.simulation.validate_semantic()?;
        Ok(config)
    }

    /// Create a builder for configuration.
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::default()
    }
}

/// Configuration builder for programmatic construction.
#[derive(Debug, Default)]
pub struct RunConfigBuilder {
    duration: Option<f64>,
    time_step: Option<f64>,
    adaptive: Option<bool>,
    output_stride: Option<usize>,
    tolerance: Option<f64>,
    step_bounds: Option<(f64, f64)>,
    max_iterations: Option<u64>,
    thresholds: Option<ResultThresholds>,
}

impl RunConfigBuilder {
    /// Set the simulated duration in seconds.
    #[must_use]
    pub const fn duration(mut self, secs: f64) -> Self {
        self.duration = Some(secs);
        self
    }

    /// Set the base time step in seconds.
    #[must_use]
    pub const fn time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }

    /// Enable or disable adaptive stepping.
    #[must_use]
    pub const fn adaptive(mut self, enabled: bool) -> Self {
        self.adaptive = Some(enabled);
        self
    }

    /// Record one sample every `stride` accepted steps.
    #[must_use]
    pub const fn output_stride(mut self, stride: usize) -> Self {
        self.output_stride = Some(stride);
        self
    }

    /// Set the adaptive error tolerance.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the adaptive step bounds.
    #[must_use]
    pub const fn step_bounds(mut self, min: f64, max: f64) -> Self {
        self.step_bounds = Some((min, max));
        self
    }

    /// Set the iteration cap.
    #[must_use]
    pub const fn max_iterations(mut self, cap: u64) -> Self {
        self.max_iterations = Some(cap);
        self
    }

    /// Set result validation thresholds.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn thresholds(mut self, thresholds: ResultThresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> RunConfig {
        let mut config = RunConfig::default();
        let sim = &mut config.simulation;

        if let Some(duration) = self.duration {
            sim.duration = duration;
        }
        if let Some(dt) = self.time_step {
            sim.time_step = dt;
        }
        if let Some(adaptive) = self.adaptive {
            sim.adaptive_stepping = adaptive;
        }
        if let Some(stride) = self.output_stride {
            sim.output_stride = stride;
        }
        if let Some(tolerance) = self.tolerance {
            sim.tolerance = tolerance;
        }
        if let Some((min, max)) = self.step_bounds {
            sim.min_time_step = min;
            sim.max_time_step = max;
        }
        if let Some(cap) = self.max_iterations {
            sim.max_iterations = cap;
        }
        if let Some(thresholds) = self.thresholds {
            config.thresholds = thresholds;
        }

        config
    }
}

/// Solver tag carried in the IR.
///
/// Every tag advances state with the semi-implicit update (velocity first,
/// then position with the new velocity); the tag is recorded for the
/// downstream consumer and reported in run statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverKind {
    /// Symplectic (semi-implicit) Euler.
    #[default]
    SemiImplicitEuler,
    /// Explicit Euler tag.
    Euler,
    /// Velocity Verlet tag.
    Verlet,
}

/// Simulation loop configuration (validated before a run starts).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Simulated duration in seconds.
    #[validate(range(min = 1e-9))]
    #[serde(default = "default_duration")]
    pub duration: f64,
    /// Base time step in seconds.
    #[validate(range(min = 1e-12, max = 10.0))]
    #[serde(default = "default_time_step")]
    pub time_step: f64,
    /// Solver tag.
    #[serde(default)]
    pub solver: SolverKind,
    /// Adaptive error tolerance (aggregate velocity change per step, m/s).
    #[validate(range(min = 1e-15))]
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Accepted steps between recorded samples.
    #[validate(range(min = 1))]
    #[serde(default = "default_output_stride")]
    pub output_stride: usize,
    /// Whether the step size adapts to the error estimate.
    #[serde(default = "default_true")]
    pub adaptive_stepping: bool,
    /// Adaptive step floor in seconds.
    #[validate(range(min = 1e-12))]
    #[serde(default = "default_min_time_step")]
    pub min_time_step: f64,
    /// Adaptive step ceiling in seconds.
    #[validate(range(min = 1e-12))]
    #[serde(default = "default_max_time_step")]
    pub max_time_step: f64,
    /// Cap on step attempts (accepted and failed).
    #[validate(range(min = 1))]
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    /// Step multiplier when the error is too large.
    #[validate(range(min = 0.01, max = 0.99))]
    #[serde(default = "default_shrink_factor")]
    pub shrink_factor: f64,
    /// Step multiplier when the error is comfortably small.
    #[validate(range(min = 1.0, max = 10.0))]
    #[serde(default = "default_growth_factor")]
    pub growth_factor: f64,
    /// Minimum successful/total step ratio for a completed run.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_min_success_ratio")]
    pub min_success_ratio: f64,
}

const fn default_true() -> bool {
    true
}

const fn default_duration() -> f64 {
    10.0
}

const fn default_time_step() -> f64 {
    0.001
}

const fn default_tolerance() -> f64 {
    0.01
}

const fn default_output_stride() -> usize {
    10
}

const fn default_min_time_step() -> f64 {
    1e-5
}

const fn default_max_time_step() -> f64 {
    0.01
}

const fn default_max_iterations() -> u64 {
    10_000_000
}

const fn default_shrink_factor() -> f64 {
    0.8
}

const fn default_growth_factor() -> f64 {
    1.2
}

const fn default_min_success_ratio() -> f64 {
    0.8
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration: default_duration(),
            time_step: default_time_step(),
            solver: SolverKind::default(),
            tolerance: default_tolerance(),
            output_stride: default_output_stride(),
            adaptive_stepping: true,
            min_time_step: default_min_time_step(),
            max_time_step: default_max_time_step(),
            max_iterations: default_max_iterations(),
            shrink_factor: default_shrink_factor(),
            growth_factor: default_growth_factor(),
            min_success_ratio: default_min_success_ratio(),
        }
    }
}

impl SimulationConfig {
    /// Schema and semantic validation in one call.
    ///
    /// # Errors
    ///
    /// Returns error if any field is out of range or the step bounds are
    /// inconsistent.
    pub fn validate_for_run(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate constraints that span several fields.
    ///
    /// # Errors
    ///
    /// Returns a configuration error describing the first inconsistency.
    pub fn validate_semantic(&self) -> SimResult<()> {
        if !(self.duration.is_finite() && self.time_step.is_finite()) {
            return Err(SimError::config("duration and time step must be finite"));
        }
        if self.time_step >= self.duration {
            return Err(SimError::config(format!(
                "time step {} must be smaller than duration {}",
                self.time_step, self.duration
            )));
        }
        if self.min_time_step > self.max_time_step {
            return Err(SimError::config(format!(
                "min time step {} exceeds max time step {}",
                self.min_time_step, self.max_time_step
            )));
        }
        if self.adaptive_stepping
            && !(self.min_time_step..=self.max_time_step).contains(&self.time_step)
        {
            return Err(SimError::config(format!(
                "time step {} outside adaptive bounds [{}, {}]",
                self.time_step, self.min_time_step, self.max_time_step
            )));
        }
        Ok(())
    }
}

/// Output format tag for the downstream consumer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// JSON document.
    #[default]
    Json,
    /// YAML document.
    Yaml,
    /// Compact binary encoding.
    Bincode,
}

/// Output section of the IR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct OutputConfig {
    /// Serialization format.
    #[serde(default)]
    pub format: OutputFormat,
    /// Frame-rate hint for renderers (frames per second).
    #[validate(range(min = 1.0, max = 240.0))]
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,
    /// Include per-sample energy aggregates.
    #[serde(default = "default_true")]
    pub include_energy: bool,
    /// Include observer event logs.
    #[serde(default = "default_true")]
    pub include_events: bool,
}

const fn default_frame_rate() -> f64 {
    30.0
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            frame_rate: default_frame_rate(),
            include_energy: true,
            include_events: true,
        }
    }
}

/// Thresholds for post-run validation.
///
/// These are tuning choices, not physical constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct ResultThresholds {
    /// Relative tolerance for energy conservation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_percent")]
    pub energy_tolerance: f64,
    /// Relative tolerance for linear momentum conservation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_percent")]
    pub momentum_tolerance: f64,
    /// Relative tolerance for angular momentum conservation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_percent")]
    pub angular_momentum_tolerance: f64,
    /// Relative tolerance for mass conservation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_mass_tolerance")]
    pub mass_tolerance: f64,
    /// Hard ceiling on entity speed (m/s).
    #[validate(range(min = 0.0))]
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    /// Largest acceptable max/min step ratio.
    #[validate(range(min = 1.0))]
    #[serde(default = "default_max_step_ratio")]
    pub max_step_ratio: f64,
    /// Multiplier on the velocity-implied displacement bound.
    #[validate(range(min = 1.0))]
    #[serde(default = "default_causality_factor")]
    pub causality_factor: f64,
    /// Sigma multiplier for speed outliers.
    #[validate(range(min = 0.5))]
    #[serde(default = "default_outlier_sigma")]
    pub outlier_sigma: f64,
    /// Relative acceleration jump still considered smooth.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_smoothness_tolerance")]
    pub smoothness_tolerance: f64,
    /// Absolute acceleration jump (m/s²) always considered smooth.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_smoothness_floor")]
    pub smoothness_floor: f64,
    /// Minimum overall score for a successful run.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default = "default_success_score")]
    pub success_score: f64,
    /// Penalty weight per constraint violation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_constraint_penalty")]
    pub constraint_penalty: f64,
    /// Penalty weight per stability issue.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_stability_penalty")]
    pub stability_penalty: f64,
    /// Penalty weight per causality violation.
    #[validate(range(min = 0.0))]
    #[serde(default = "default_causality_penalty")]
    pub causality_penalty: f64,
}

const fn default_percent() -> f64 {
    0.01
}

const fn default_mass_tolerance() -> f64 {
    0.001
}

const fn default_max_speed() -> f64 {
    SPEED_OF_LIGHT
}

const fn default_max_step_ratio() -> f64 {
    10.0
}

const fn default_causality_factor() -> f64 {
    2.0
}

const fn default_outlier_sigma() -> f64 {
    3.0
}

const fn default_smoothness_tolerance() -> f64 {
    0.5
}

const fn default_smoothness_floor() -> f64 {
    1.0
}

const fn default_success_score() -> f64 {
    0.8
}

const fn default_constraint_penalty() -> f64 {
    0.1
}

const fn default_stability_penalty() -> f64 {
    0.05
}

const fn default_causality_penalty() -> f64 {
    0.1
}

impl Default for ResultThresholds {
    fn default() -> Self {
        Self {
            energy_tolerance: default_percent(),
            momentum_tolerance: default_percent(),
            angular_momentum_tolerance: default_percent(),
            mass_tolerance: default_mass_tolerance(),
            max_speed: default_max_speed(),
            max_step_ratio: default_max_step_ratio(),
            causality_factor: default_causality_factor(),
            outlier_sigma: default_outlier_sigma(),
            smoothness_tolerance: default_smoothness_tolerance(),
            smoothness_floor: default_smoothness_floor(),
            success_score: default_success_score(),
            constraint_penalty: default_constraint_penalty(),
            stability_penalty: default_stability_penalty(),
            causality_penalty: default_causality_penalty(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.simulation.validate_for_run().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RunConfig::builder()
            .duration(2.0)
            .time_step(0.002)
            .adaptive(false)
            .output_stride(5)
            .tolerance(0.05)
            .step_bounds(1e-4, 0.02)
            .max_iterations(1000)
            .build();
        let sim = config.simulation;
        assert!((sim.duration - 2.0).abs() < f64::EPSILON);
        assert!((sim.time_step - 0.002).abs() < f64::EPSILON);
        assert!(!sim.adaptive_stepping);
        assert_eq!(sim.output_stride, 5);
        assert_eq!(sim.max_iterations, 1000);
        assert!((sim.min_time_step - 1e-4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_yaml_minimal() {
        let config = RunConfig::from_yaml("simulation:\n  duration: 1.0\n").unwrap();
        assert!((config.simulation.duration - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.simulation.output_stride, 10);
        assert_eq!(config.simulation.solver, SolverKind::SemiImplicitEuler);
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r"
schema_version: '1.0'
simulation:
  duration: 5.0
  time_step: 0.002
  solver: verlet
  tolerance: 0.02
  output_stride: 2
  adaptive_stepping: false
  min_time_step: 0.0001
  max_time_step: 0.01
  max_iterations: 100000
output:
  format: yaml
  frame_rate: 60.0
thresholds:
  energy_tolerance: 0.05
  max_step_ratio: 20.0
";
        let config = RunConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.simulation.solver, SolverKind::Verlet);
        assert_eq!(config.output.format, OutputFormat::Yaml);
        assert!((config.thresholds.energy_tolerance - 0.05).abs() < f64::EPSILON);
        assert!((config.thresholds.mass_tolerance - 0.001).abs() < f64::EPSILON);
    }

    #[test]
    fn test_from_yaml_rejects_unknown_field() {
        let result = RunConfig::from_yaml("bogus: 1\n");
        assert!(matches!(result, Err(SimError::YamlParse(_))));
    }

    #[test]
    fn test_from_yaml_rejects_zero_stride() {
        let result = RunConfig::from_yaml("simulation:\n  output_stride: 0\n");
        assert!(matches!(result, Err(SimError::Validation(_))));
    }

    #[test]
    fn test_semantic_step_exceeds_duration() {
        let config = RunConfig::builder()
            .duration(0.001)
            .time_step(0.01)
            .adaptive(false)
            .build();
        assert!(config.simulation.validate_semantic().is_err());
    }

    #[test]
    fn test_semantic_step_outside_bounds() {
        let config = RunConfig::builder()
            .time_step(0.5)
            .step_bounds(1e-4, 0.01)
            .build();
        let err = config.simulation.validate_semantic().unwrap_err();
        assert!(err.to_string().contains("outside adaptive bounds"));
    }

    #[test]
    fn test_semantic_inverted_bounds() {
        let config = RunConfig::builder()
            .adaptive(false)
            .step_bounds(0.1, 0.01)
            .build();
        assert!(config.simulation.validate_semantic().is_err());
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "simulation:\n  duration: 3.0").unwrap();
        let config = RunConfig::load(file.path()).unwrap();
        assert!((config.simulation.duration - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_file() {
        let result = RunConfig::load("/nonexistent/run.yaml");
        assert!(matches!(result, Err(SimError::Io(_))));
    }

    #[test]
    fn test_thresholds_defaults() {
        let t = ResultThresholds::default();
        assert!((t.energy_tolerance - 0.01).abs() < f64::EPSILON);
        assert!((t.mass_tolerance - 0.001).abs() < f64::EPSILON);
        assert!((t.max_step_ratio - 10.0).abs() < f64::EPSILON);
        assert!((t.outlier_sigma - 3.0).abs() < f64::EPSILON);
    }
}
