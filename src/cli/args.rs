//! CLI argument parsing.
//!
//! Parsing takes any iterator of strings so it can be tested without a
//! process environment.

use std::path::PathBuf;

/// CLI arguments container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// The command to execute.
    pub command: Command,
    /// Log level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub log_level: Option<String>,
}

/// Available CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run a problem end to end and print the report.
    Run {
        /// Path to the problem JSON file.
        problem_path: PathBuf,
        /// Optional run configuration YAML.
        config_path: Option<PathBuf>,
    },
    /// Build and validate the IR without simulating.
    Validate {
        /// Path to the problem JSON file.
        problem_path: PathBuf,
        /// Optional run configuration YAML.
        config_path: Option<PathBuf>,
    },
    /// Run a problem several times and compare fingerprints.
    Verify {
        /// Path to the problem JSON file.
        problem_path: PathBuf,
        /// Number of runs.
        runs: usize,
    },
    /// List the module catalog.
    Modules,
    /// Show help
    Help,
    /// Show version
    Version,
}

impl Args {
    /// Parse command-line arguments from an iterator.
    #[must_use]
    pub fn parse_from<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        Self::parse_from_vec(&args)
    }

    /// Parse command-line arguments from the environment.
    #[must_use]
    pub fn parse() -> Self {
        Self::parse_from(std::env::args())
    }

    fn parse_from_vec(args: &[String]) -> Self {
        let log_level = option_value(args, "--log-level");
        let Some(first) = args.get(1) else {
            return Self {
                command: Command::Help,
                log_level,
            };
        };

        let command = match first.as_str() {
            "run" => Self::parse_problem_command(args, "run").map_or(Command::Help, |(p, c)| {
                Command::Run {
                    problem_path: p,
                    config_path: c,
                }
            }),
            "validate" => Self::parse_problem_command(args, "validate").map_or(
                Command::Help,
                |(p, c)| Command::Validate {
                    problem_path: p,
                    config_path: c,
                },
            ),
            "verify" => Self::parse_verify_command(args),
            "modules" => Command::Modules,
            "-h" | "--help" | "help" => Command::Help,
            "-V" | "--version" | "version" => Command::Version,
            unknown => {
                eprintln!("Unknown command: {unknown}");
                Command::Help
            }
        };

        Self { command, log_level }
    }

    /// `<command> <problem.json> [--config run.yaml]`
    fn parse_problem_command(args: &[String], name: &str) -> Option<(PathBuf, Option<PathBuf>)> {
        let Some(path) = args.get(2).filter(|a| !a.starts_with("--")) else {
            eprintln!("Error: '{name}' command requires a problem path");
            return None;
        };
        let config = option_value(args, "--config").map(PathBuf::from);
        Some((PathBuf::from(path), config))
    }

    fn parse_verify_command(args: &[String]) -> Command {
        let Some((problem_path, _)) = Self::parse_problem_command(args, "verify") else {
            return Command::Help;
        };
        let runs = option_value(args, "--runs")
            .and_then(|n| n.parse().ok())
            .filter(|&n: &usize| n >= 2)
            .unwrap_or(3);
        Command::Verify { problem_path, runs }
    }
}

/// Value following `flag`, if present.
fn option_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
