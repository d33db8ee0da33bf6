//! CLI output formatting.
//!
//! Reports go to stdout as JSON; human-readable summaries go to stderr so
//! the JSON stays pipeable.

use std::fmt::Write as _;

use crate::library::ModuleLibrary;
use crate::pipeline::PipelineReport;
use crate::validation::ValidationReport;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Print version information.
pub fn print_version() {
    println!("physir {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message.
pub fn print_help() {
    println!(
        r"physir - physical-problem IR, simulation and result verification

USAGE:
    physir <COMMAND> [OPTIONS]

COMMANDS:
    run <problem.json>          Build, validate, simulate and verify; prints JSON
        --config <run.yaml>     Run configuration

    validate <problem.json>     Build and validate the IR only; prints JSON
        --config <run.yaml>     Run configuration

    verify <problem.json>       Check runs reproduce bit-identical series
        --runs <N>              Number of runs (default: 3)

    modules                     List the module catalog

    help                        Show this help message
    version                     Show version information

GLOBAL OPTIONS:
    --log-level <LEVEL>         error, warn, info, debug or trace (default: RUST_LOG or warn)

EXAMPLES:
    physir run problems/free_fall.json
    physir run problems/spring.json --config run.yaml --log-level info
    physir verify problems/spring.json --runs 5
"
    );
}

/// Catalog listing, one module per line.
#[must_use]
pub fn format_modules(library: &ModuleLibrary) -> String {
    let mut out = String::new();
    for entry in library.entries() {
        let symbols: Vec<&str> = entry.parameters.iter().map(|p| p.symbol.as_str()).collect();
        let _ = write!(out, "{:<16} {:<14} {}", entry.id, entry.domain.as_str(), entry.name);
        if !entry.dependencies.is_empty() {
            let _ = write!(out, " (needs {})", entry.dependencies.join(", "));
        }
        let _ = writeln!(out, "\n{:<16} params: {}", "", symbols.join(" "));
    }
    out
}

/// Human summary of a validation report.
#[must_use]
pub fn format_validation(report: &ValidationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    for pass in &report.passes {
        let sym = if pass.valid { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "  {sym} {:<11} {} error(s), {} warning(s)",
            pass.category.to_string(),
            pass.errors.len(),
            pass.warnings.len()
        );
    }
    for finding in report.errors() {
        let _ = writeln!(out, "  ✗ {finding}");
    }
    for finding in report.warnings() {
        let _ = writeln!(out, "  ! {finding}");
    }
    let _ = writeln!(out, "  Score: {:.3}  Runnable: {}", report.score, report.can_run());
    let _ = writeln!(out, "{RULE}");
    out
}

/// Human summary of a pipeline report.
#[must_use]
pub fn format_summary(report: &PipelineReport) -> String {
    let mut out = String::new();
    let status = if report.success() { "✓ SUCCESS" } else { "✗ FAILED" };
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "Character:   {}", report.run.character);
    let _ = writeln!(out, "Samples:     {}", report.run.series.len());
    let _ = writeln!(
        out,
        "Steps:       {} accepted, {} failed",
        report.run.stats.accepted_steps, report.run.stats.failed_steps
    );
    for check in &report.result.conservation {
        let sym = if check.passed { "✓" } else { "✗" };
        let _ = writeln!(
            out,
            "  {sym} {:<16} deviation {:.2e} (tolerance {:.2e})",
            check.kind.as_str(),
            check.deviation,
            check.tolerance
        );
    }
    for error in &report.result.errors {
        let _ = writeln!(out, "  ✗ {error}");
    }
    for warning in &report.result.warnings {
        let _ = writeln!(out, "  ! {warning}");
    }
    let _ = writeln!(out, "Quality:     {:.3}", report.result.data_quality.score);
    let _ = writeln!(out, "Score:       {:.3}", report.result.score);
    let _ = writeln!(out, "Fingerprint: {}", report.fingerprint);
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(out, "{status}");
    out
}
