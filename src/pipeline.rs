//! End-to-end pipeline: build, validate, gate, simulate, verify.
//!
//! A [`Pipeline`] owns the module library and run configuration and is
//! shared by reference, so independent problems run in parallel with no
//! shared mutable state.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::engine::{CancellationToken, SimEngine, SimulationRun};
use crate::error::{SimError, SimResult};
use crate::input::ProblemInput;
use crate::ir::{IrBuilder, PhysicsIr};
use crate::library::ModuleLibrary;
use crate::validation::{IrValidator, ValidationReport};
use crate::verify::{ResultReport, ResultValidator};

/// Everything one pipeline run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// The built IR.
    pub ir: PhysicsIr,
    /// Pre-run validation.
    pub validation: ValidationReport,
    /// The simulation.
    pub run: SimulationRun,
    /// Post-run verification.
    pub result: ResultReport,
    /// Hex fingerprint of the recorded series.
    pub fingerprint: String,
}

impl PipelineReport {
    /// Whether the run completed and verification succeeded.
    #[must_use]
    pub fn success(&self) -> bool {
        self.run.is_completed() && self.result.success
    }
}

/// Problem pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    library: ModuleLibrary,
    config: RunConfig,
    validator: IrValidator,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(RunConfig::default())
    }
}

impl Pipeline {
    /// Pipeline over the standard module library.
    #[must_use]
    pub fn new(config: RunConfig) -> Self {
        Self::with_library(ModuleLibrary::standard(), config)
    }

    /// Pipeline over a custom library.
    #[must_use]
    pub fn with_library(library: ModuleLibrary, config: RunConfig) -> Self {
        Self {
            library,
            config,
            validator: IrValidator::new(),
        }
    }

    /// Module library.
    #[must_use]
    pub const fn library(&self) -> &ModuleLibrary {
        &self.library
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Build the IR for a problem. Never fails.
    #[must_use]
    pub fn build(&self, input: &ProblemInput) -> PhysicsIr {
        IrBuilder::new(&self.library)
            .with_simulation(self.config.simulation)
            .with_output(self.config.output.clone())
            .build(input)
    }

    /// Run one problem end to end.
    ///
    /// # Errors
    ///
    /// - `ValidationBlocked` if a blocking validation pass reported errors
    /// - any fatal engine error (`StepCollapse`, `IterationCap`, ...)
    pub fn run(&self, input: &ProblemInput) -> SimResult<PipelineReport> {
        self.run_with_cancellation(input, CancellationToken::new())
    }

    /// Run one problem, stopping between steps once `token` is cancelled.
    ///
    /// # Errors
    ///
    /// As [`Pipeline::run`], plus `Cancelled`.
    pub fn run_with_cancellation(
        &self,
        input: &ProblemInput,
        token: CancellationToken,
    ) -> SimResult<PipelineReport> {
        let ir = self.build(input);
        let validation = self.validator.validate(&ir);
        if !validation.can_run() {
            let errors = validation.blocking_errors();
            warn!(errors = errors.len(), "run blocked by validation");
            return Err(SimError::ValidationBlocked { errors });
        }

        let run = SimEngine::new(&ir)?.with_cancellation(token).run()?;
        let result = ResultValidator::new(self.config.thresholds).validate(&ir, &run);
        let fingerprint = run.series.fingerprint()?;
        info!(
            fingerprint = %&fingerprint[..16.min(fingerprint.len())],
            success = result.success,
            "pipeline finished"
        );

        Ok(PipelineReport {
            ir,
            validation,
            run,
            result,
            fingerprint,
        })
    }

    /// Run independent problems in parallel. Results keep input order and
    /// one failure does not affect the others.
    #[must_use]
    pub fn run_batch(&self, inputs: &[ProblemInput]) -> Vec<SimResult<PipelineReport>> {
        info!(problems = inputs.len(), "batch started");
        inputs.par_iter().map(|input| self.run(input)).collect()
    }
}
