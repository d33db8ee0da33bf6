//! CLI command handlers.

use std::path::Path;
use std::process::ExitCode;

use tracing::error;

use crate::config::RunConfig;
use crate::error::{SimError, SimResult};
use crate::input::ProblemInput;
use crate::library::ModuleLibrary;
use crate::pipeline::Pipeline;
use crate::validation::IrValidator;

use super::output::{format_modules, format_summary, format_validation, print_help, print_version};
use super::{Args, Command};

/// Main CLI entry point.
#[must_use]
pub fn run_cli(args: Args) -> ExitCode {
    match args.command {
        Command::Run {
            problem_path,
            config_path,
        } => run_problem(&problem_path, config_path.as_deref()),
        Command::Validate {
            problem_path,
            config_path,
        } => validate_problem(&problem_path, config_path.as_deref()),
        Command::Verify { problem_path, runs } => verify_reproducibility(&problem_path, runs),
        Command::Modules => {
            print!("{}", format_modules(&ModuleLibrary::standard()));
            ExitCode::SUCCESS
        }
        Command::Help => {
            print_help();
            ExitCode::SUCCESS
        }
        Command::Version => {
            print_version();
            ExitCode::SUCCESS
        }
    }
}

fn load(problem: &Path, config: Option<&Path>) -> SimResult<(ProblemInput, RunConfig)> {
    let input = ProblemInput::load(problem)?;
    let config = match config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    Ok((input, config))
}

fn exit_with(e: &SimError) -> ExitCode {
    error!(error = %e, "command failed");
    eprintln!("Error: {e}");
    ExitCode::from(1)
}

/// Run a problem end to end; the report is printed as JSON.
#[must_use]
pub fn run_problem(path: &Path, config: Option<&Path>) -> ExitCode {
    let (input, config) = match load(path, config) {
        Ok(loaded) => loaded,
        Err(e) => return exit_with(&e),
    };
    let report = match Pipeline::new(config).run(&input) {
        Ok(report) => report,
        Err(e) => return exit_with(&e),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => return exit_with(&SimError::from(e)),
    }
    eprint!("{}", format_summary(&report));
    if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

/// Build and validate a problem's IR; the validation report is printed as
/// JSON.
#[must_use]
pub fn validate_problem(path: &Path, config: Option<&Path>) -> ExitCode {
    let (input, config) = match load(path, config) {
        Ok(loaded) => loaded,
        Err(e) => return exit_with(&e),
    };
    let ir = Pipeline::new(config).build(&input);
    let report = IrValidator::new().validate(&ir);
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => return exit_with(&SimError::from(e)),
    }
    eprint!("{}", format_validation(&report));
    if report.can_run() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    }
}

/// Run a problem `runs` times and check every series fingerprint matches.
#[must_use]
pub fn verify_reproducibility(path: &Path, runs: usize) -> ExitCode {
    let (input, config) = match load(path, None) {
        Ok(loaded) => loaded,
        Err(e) => return exit_with(&e),
    };
    let pipeline = Pipeline::new(config);
    let mut fingerprints = Vec::with_capacity(runs);
    for _ in 0..runs {
        match pipeline.run(&input) {
            Ok(report) => fingerprints.push(report.fingerprint),
            Err(e) => return exit_with(&e),
        }
    }

    let Some(reference) = fingerprints.first() else {
        return ExitCode::SUCCESS;
    };
    let identical = fingerprints.iter().all(|f| f == reference);
    println!("Reference: {reference}");
    for (i, fingerprint) in fingerprints.iter().enumerate() {
        let mark = if fingerprint == reference { "=" } else { "!" };
        println!("  Run {}: {fingerprint} {mark}", i + 1);
    }
    if identical {
        println!("✓ {runs} runs identical");
        ExitCode::SUCCESS
    } else {
        println!("✗ runs differ");
        ExitCode::from(1)
    }
}
