//! Command-line interface.
//!
//! All CLI logic lives here so `main.rs` only installs logging and
//! dispatches to [`run_cli`].

mod args;
mod commands;
mod output;

pub use args::{Args, Command};
pub use commands::{run_cli, run_problem, validate_problem, verify_reproducibility};
pub use output::{format_modules, format_summary, format_validation, print_help, print_version};

#[cfg(test)]
mod tests;
