//! # physir
//!
//! Physical-problem intermediate representation, validation, simulation
//! and result verification.
//!
//! A structured problem description flows through:
//! - IR construction from a module catalog (never fails, defaults recorded)
//! - Six-pass IR validation with a blocking gate
//! - Deterministic adaptive-step simulation dispatched on physics character
//! - Conservation, stability, causality and data-quality verification
//!
//! ## Example
//!
//! ```rust
//! use physir::prelude::*;
//!
//! let input = ProblemInput::new("")
//!     .with_module("dynamics")
//!     .with_parameter("m", 2.0, "kg")
//!     .with_parameter("g", 9.8, "m/s^2")
//!     .with_object(InputObject::new("ball").with_mass(2.0).with_position(0.0, 10.0, 0.0));
//!
//! let config = RunConfig::builder().duration(0.5).build();
//! let report = Pipeline::new(config).run(&input).expect("runs");
//! assert!(report.run.is_completed());
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,
)]

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod ir;
pub mod library;
pub mod pipeline;
pub mod units;
pub mod validation;
pub mod verify;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{ResultThresholds, RunConfig, SimulationConfig};
    pub use crate::engine::{CancellationToken, SimEngine, SimTime, SimulationRun};
    pub use crate::error::{SimError, SimResult};
    pub use crate::input::{InputObject, ProblemInput};
    pub use crate::ir::{IrBuilder, PhysicsIr};
    pub use crate::library::ModuleLibrary;
    pub use crate::pipeline::{Pipeline, PipelineReport};
    pub use crate::validation::{IrValidator, ValidationReport};
    pub use crate::verify::{ResultReport, ResultValidator};
}

/// Re-export for public API
pub use error::{SimError, SimResult};
