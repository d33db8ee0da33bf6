//! Structured validation report.
//!
//! A plain record consumable by any downstream gate: per-pass validity,
//! a score, and coded findings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The six validation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    /// Required sections and simulation bounds.
    Structural,
    /// Parameter uniqueness, roles and resolution.
    Logical,
    /// Module and parameter dependency graphs.
    Dependency,
    /// Dimensions and environment sanity.
    Physics,
    /// Unit presence and allow-list.
    Units,
    /// Equation token resolution.
    Equations,
}

impl ValidationCategory {
    /// Whether errors in this pass block a run from starting.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        matches!(self, Self::Structural | Self::Dependency | Self::Equations)
    }

    /// Code prefix used by findings of this pass.
    #[must_use]
    pub const fn code_prefix(&self) -> &'static str {
        match self {
            Self::Structural => "IR-S",
            Self::Logical => "IR-L",
            Self::Dependency => "IR-D",
            Self::Physics => "IR-P",
            Self::Units => "IR-U",
            Self::Equations => "IR-E",
        }
    }
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Structural => "structural",
            Self::Logical => "logical",
            Self::Dependency => "dependency",
            Self::Physics => "physics",
            Self::Units => "units",
            Self::Equations => "equations",
        };
        f.write_str(name)
    }
}

/// One error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// Code (`IR-E01`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Symbol, module or section the finding is about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Suggested fix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    /// Create a finding.
    #[must_use]
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            subject: None,
            suggestion: None,
        }
    }

    /// Attach the subject.
    #[must_use]
    pub fn about(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Attach a suggestion.
    #[must_use]
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(s) = &self.suggestion {
            write!(f, " ({s})")?;
        }
        Ok(())
    }
}

/// Outcome of one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResult {
    /// Which pass.
    pub category: ValidationCategory,
    /// No errors were found.
    pub valid: bool,
    /// Errors.
    pub errors: Vec<Finding>,
    /// Warnings.
    pub warnings: Vec<Finding>,
}

impl PassResult {
    /// Empty result for a pass.
    #[must_use]
    pub const fn new(category: ValidationCategory) -> Self {
        Self {
            category,
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn code(&self, number: u8) -> String {
        format!("{}{number:02}", self.category.code_prefix())
    }

    /// Record an error with a numbered code.
    pub fn error(&mut self, number: u8, finding: impl FnOnce(String) -> Finding) {
        let f = finding(self.code(number));
        self.errors.push(f);
        self.valid = false;
    }

    /// Record a warning with a numbered code.
    pub fn warn(&mut self, number: u8, finding: impl FnOnce(String) -> Finding) {
        let f = finding(self.code(number));
        self.warnings.push(f);
    }
}

/// Report of one IR validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Results of the passes that ran, in run order.
    pub passes: Vec<PassResult>,
    /// Passed / run.
    pub score: f64,
    /// Every pass that ran is valid.
    pub valid: bool,
    /// Unix time of the validation, in seconds.
    pub timestamp: u64,
}

impl ValidationReport {
    /// Assemble a report from pass results.
    #[must_use]
    pub fn from_passes(passes: Vec<PassResult>) -> Self {
        let run = passes.len();
        let passed = passes.iter().filter(|p| p.valid).count();
        let score = if run == 0 {
            1.0
        } else {
            passed as f64 / run as f64
        };
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            valid: passed == run,
            passes,
            score,
            timestamp,
        }
    }

    /// Result of one pass, if it ran.
    #[must_use]
    pub fn pass(&self, category: ValidationCategory) -> Option<&PassResult> {
        self.passes.iter().find(|p| p.category == category)
    }

    /// Whether a pass ran and found no errors.
    #[must_use]
    pub fn is_valid(&self, category: ValidationCategory) -> bool {
        self.pass(category).is_some_and(|p| p.valid)
    }

    /// Whether no blocking pass that ran has errors.
    #[must_use]
    pub fn can_run(&self) -> bool {
        self.passes
            .iter()
            .filter(|p| p.category.is_blocking())
            .all(|p| p.valid)
    }

    /// Every error, across passes.
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.passes.iter().flat_map(|p| &p.errors)
    }

    /// Every warning, across passes.
    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.passes.iter().flat_map(|p| &p.warnings)
    }

    /// Errors from blocking passes, rendered.
    #[must_use]
    pub fn blocking_errors(&self) -> Vec<String> {
        self.passes
            .iter()
            .filter(|p| p.category.is_blocking())
            .flat_map(|p| &p.errors)
            .map(ToString::to_string)
            .collect()
    }
}
