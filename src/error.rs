//! Error types for physir.
//!
//! Building an IR never fails and validation findings are report data, so
//! the variants here cover configuration problems, I/O, and the few ways a
//! simulation run can stop early. All fallible functions return
//! `Result<T, SimError>` instead of panicking.

use thiserror::Error;

/// Result type alias for physir operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all physir operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Step failures =====
    /// Numerical instability detected (NaN or Inf).
    #[error("non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Step halving went below the configured floor without a finite result.
    #[error("step collapse at t={time:.6}s: step {step:.3e}s is below the minimum time step")]
    StepCollapse {
        /// Simulation time of the failing step.
        time: f64,
        /// Step size that was last attempted.
        step: f64,
    },

    /// Iteration cap reached before the run covered its duration.
    #[error("iteration cap of {iterations} reached before the end of the run")]
    IterationCap {
        /// Configured cap.
        iterations: u64,
    },

    /// Run cancelled between two steps.
    #[error("run cancelled at t={time:.6}s")]
    Cancelled {
        /// Simulation time at which the cancellation was observed.
        time: f64,
    },

    /// A sample was appended out of time order.
    #[error("sample at t={next:.9}s does not follow t={previous:.9}s")]
    NonMonotonicSample {
        /// Timestamp of the last accepted sample.
        previous: f64,
        /// Timestamp of the rejected sample.
        next: f64,
    },

    // ===== Gating =====
    /// IR validation blocked the run from starting.
    #[error("IR validation blocked the run: {}", errors.join("; "))]
    ValidationBlocked {
        /// Blocking validation errors.
        errors: Vec<String>,
    },

    // ===== Configuration errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== I/O errors =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization(message.into())
    }

    /// Check if this error ended a simulation loop (fatal step failure).
    #[must_use]
    pub const fn is_fatal_step_failure(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. } | Self::StepCollapse { .. } | Self::IterationCap { .. }
        )
    }
}
