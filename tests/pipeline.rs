//! Pipeline gating, configuration loading and result reporting.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::Write;

use physir::engine::PhysicsCharacter;
use physir::prelude::*;

fn problem_json() -> &'static str {
    r#"{
        "system_type": "",
        "modules": ["dynamics"],
        "parameters": [
            { "symbol": "m", "value": 1.5, "unit": "kg" },
            { "symbol": "g", "value": 9.8, "unit": "m/s^2" }
        ],
        "objects": [
            { "id": "crate", "mass": 1.5, "position": [0, 20], "velocity": { "x": 2.0 } }
        ]
    }"#
}

#[test]
fn test_problem_from_json_runs() {
    let input = ProblemInput::from_json(problem_json()).unwrap();
    let report = Pipeline::new(RunConfig::builder().duration(0.5).build())
        .run(&input)
        .unwrap();
    assert_eq!(report.run.character, PhysicsCharacter::MixedKinematics);
    let start = &report.run.series.first().unwrap().entities[0];
    assert_eq!(start.id, "crate");
    assert!((start.position.y - 20.0).abs() < 1e-12);
    assert!((start.velocity.x - 2.0).abs() < 1e-12);
    assert!(report.success());
}

#[test]
fn test_config_file_drives_run() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "schema_version: \"1.0\"\n\
         simulation:\n  duration: 0.25\n  time_step: 0.001\n  adaptive_stepping: false\n  output_stride: 50\n\
         thresholds:\n  success_score: 0.9"
    )
    .unwrap();
    let config = RunConfig::load(file.path()).unwrap();
    assert!((config.thresholds.success_score - 0.9).abs() < f64::EPSILON);

    let input = ProblemInput::from_json(problem_json()).unwrap();
    let report = Pipeline::new(config).run(&input).unwrap();
    // 250 steps at stride 50, plus t = 0.
    assert_eq!(report.run.series.len(), 6);
    assert_eq!(report.run.stats.accepted_steps, 250);
}

#[test]
fn test_invalid_config_rejected_on_load() {
    let yaml = "simulation:\n  duration: 1.0\n  time_step: 0.001\n  min_time_step: 0.01\n  max_time_step: 0.001\n";
    assert!(RunConfig::from_yaml(yaml).is_err());
}

#[test]
fn test_structural_error_blocks_before_simulation() {
    let input = ProblemInput::from_json(problem_json())
        .unwrap()
        .with_simulation(SimulationConfig {
            duration: -1.0,
            ..SimulationConfig::default()
        });
    let err = Pipeline::default().run(&input).unwrap_err();
    assert!(matches!(err, SimError::ValidationBlocked { .. }));
    assert!(err.to_string().contains("IR-S02"));
}

#[test]
fn test_strict_thresholds_fail_verification() {
    let thresholds = ResultThresholds {
        max_speed: 1.0,
        success_score: 0.99,
        ..ResultThresholds::default()
    };
    let config = RunConfig::builder().duration(0.5).thresholds(thresholds).build();
    let input = ProblemInput::from_json(problem_json()).unwrap();
    let report = Pipeline::new(config).run(&input).unwrap();

    assert!(report.run.is_completed());
    assert!(!report.result.constraint_violations.is_empty());
    assert!(report.result.score < 0.99);
    assert!(!report.success());
}

#[test]
fn test_report_serializes() {
    let input = ProblemInput::from_json(problem_json()).unwrap();
    let report = Pipeline::new(RunConfig::builder().duration(0.1).build())
        .run(&input)
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();
    assert!(json["result"]["score"].is_number());
    assert!(json["validation"]["passes"].is_array());
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn test_customary_units_drive_run_in_si() {
    let input = ProblemInput::new("")
        .with_module("oscillation")
        .with_parameter("k", 100.0, "N/m")
        .with_parameter("m", 500.0, "g")
        .with_parameter("v0", 50.0, "cm/s")
        .with_simulation(SimulationConfig {
            duration: 0.5,
            time_step: 0.001,
            output_stride: 1,
            adaptive_stepping: false,
            ..SimulationConfig::default()
        });
    let report = Pipeline::default().run(&input).unwrap();
    assert!(report.validation.warnings().all(|w| w.code != "IR-U02"));

    let start = &report.run.series.first().unwrap().entities[0];
    assert!((start.mass - 0.5).abs() < 1e-12);
    assert!((start.velocity.x - 0.5).abs() < 1e-12);

    let max_speed = report
        .run
        .series
        .samples()
        .iter()
        .flat_map(|s| &s.entities)
        .map(|e| e.velocity.magnitude())
        .fold(0.0, f64::max);
    assert!((max_speed - 0.5).abs() < 0.01, "max speed {max_speed}");
}
