//! CLI module tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::args::{Args, Command};
use super::commands::{run_problem, validate_problem, verify_reproducibility};
use super::output::{format_modules, format_summary, format_validation};
use crate::config::SimulationConfig;
use crate::input::{InputObject, ProblemInput};
use crate::library::ModuleLibrary;
use crate::pipeline::Pipeline;
use crate::validation::IrValidator;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

// ============================================================================
// Args parsing tests
// ============================================================================

#[test]
fn test_parse_no_args_shows_help() {
    let args = Args::parse_from(["physir"]);
    assert_eq!(args.command, Command::Help);
    assert_eq!(args.log_level, None);
}

#[test]
fn test_parse_help_and_version() {
    for flag in ["-h", "--help", "help"] {
        assert_eq!(Args::parse_from(["physir", flag]).command, Command::Help);
    }
    for flag in ["-V", "--version", "version"] {
        assert_eq!(Args::parse_from(["physir", flag]).command, Command::Version);
    }
}

#[test]
fn test_parse_unknown_command_shows_help() {
    assert_eq!(Args::parse_from(["physir", "frobnicate"]).command, Command::Help);
}

#[test]
fn test_parse_run_with_config_and_log_level() {
    let args = Args::parse_from([
        "physir",
        "run",
        "p.json",
        "--config",
        "run.yaml",
        "--log-level",
        "debug",
    ]);
    assert_eq!(
        args.command,
        Command::Run {
            problem_path: PathBuf::from("p.json"),
            config_path: Some(PathBuf::from("run.yaml")),
        }
    );
    assert_eq!(args.log_level.as_deref(), Some("debug"));
}

#[test]
fn test_parse_run_without_path_shows_help() {
    assert_eq!(Args::parse_from(["physir", "run"]).command, Command::Help);
    assert_eq!(
        Args::parse_from(["physir", "run", "--config", "x.yaml"]).command,
        Command::Help
    );
}

#[test]
fn test_parse_validate() {
    let args = Args::parse_from(["physir", "validate", "p.json"]);
    assert_eq!(
        args.command,
        Command::Validate {
            problem_path: PathBuf::from("p.json"),
            config_path: None,
        }
    );
}

#[test]
fn test_parse_verify_runs() {
    let args = Args::parse_from(["physir", "verify", "p.json", "--runs", "5"]);
    assert_eq!(
        args.command,
        Command::Verify {
            problem_path: PathBuf::from("p.json"),
            runs: 5,
        }
    );
    // Fewer than two runs cannot compare anything.
    let args = Args::parse_from(["physir", "verify", "p.json", "--runs", "1"]);
    assert!(matches!(args.command, Command::Verify { runs: 3, .. }));
    let args = Args::parse_from(["physir", "verify", "p.json", "--runs", "many"]);
    assert!(matches!(args.command, Command::Verify { runs: 3, .. }));
}

#[test]
fn test_parse_modules() {
    assert_eq!(Args::parse_from(["physir", "modules"]).command, Command::Modules);
}

// ============================================================================
// Output tests
// ============================================================================

fn drop_problem() -> ProblemInput {
    ProblemInput::new("")
        .with_module("dynamics")
        .with_parameter("m", 2.0, "kg")
        .with_parameter("g", 9.8, "m/s^2")
        .with_object(InputObject::new("ball").with_mass(2.0).with_position(0.0, 100.0, 0.0))
        .with_simulation(SimulationConfig {
            duration: 0.2,
            ..SimulationConfig::default()
        })
}

#[test]
fn test_format_modules_lists_catalog() {
    let text = format_modules(&ModuleLibrary::standard());
    assert!(text.contains("oscillation"));
    assert!(text.contains("needs kinematics"));
    assert!(text.contains("params:"));
}

#[test]
fn test_format_validation() {
    let ir = Pipeline::default().build(&drop_problem());
    let text = format_validation(&IrValidator::new().validate(&ir));
    assert!(text.contains("structural"));
    assert!(text.contains("Runnable: true"));
}

#[test]
fn test_format_summary() {
    let report = Pipeline::default().run(&drop_problem()).unwrap();
    let text = format_summary(&report);
    assert!(text.contains("mixed_kinematics"));
    assert!(text.contains(&report.fingerprint));
    assert!(text.contains("energy"));
}

// ============================================================================
// Command tests
// ============================================================================

fn write_problem(input: &ProblemInput) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(input).unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_run_problem_succeeds() {
    let file = write_problem(&drop_problem());
    assert_eq!(run_problem(file.path(), None), ExitCode::SUCCESS);
}

#[test]
fn test_run_missing_file_fails() {
    let code = run_problem(&PathBuf::from("/nonexistent/problem.json"), None);
    assert_eq!(code, ExitCode::from(1));
}

#[test]
fn test_validate_problem_with_config() {
    let file = write_problem(&drop_problem());
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config
        .write_all(b"simulation:\n  duration: 0.5\n  time_step: 0.001\n")
        .unwrap();
    assert_eq!(validate_problem(file.path(), Some(config.path())), ExitCode::SUCCESS);
}

#[test]
fn test_validate_bad_config_fails() {
    let file = write_problem(&drop_problem());
    let mut config = tempfile::NamedTempFile::new().unwrap();
    config.write_all(b"unknown_section: 1\n").unwrap();
    assert_eq!(validate_problem(file.path(), Some(config.path())), ExitCode::from(1));
}

#[test]
fn test_verify_reproducibility_identical() {
    let file = write_problem(&drop_problem());
    assert_eq!(verify_reproducibility(file.path(), 2), ExitCode::SUCCESS);
}
