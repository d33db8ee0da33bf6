//! End-to-end acceptance scenarios: build, validate, simulate, verify.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use physir::engine::{EventDetector, EventKind, PhysicsCharacter, SimEngine};
use physir::ir::{Equation, EquationKind, IrBuilder};
use physir::prelude::*;
use physir::validation::{ValidationCategory, ValidationPasses};

fn build(input: &ProblemInput) -> PhysicsIr {
    let library = ModuleLibrary::standard();
    IrBuilder::new(&library).build(input)
}

// ============================================================================
// Scenario A: one 2 kg body falling under g = 9.8 m/s²
// ============================================================================

fn free_fall() -> ProblemInput {
    ProblemInput::new("")
        .with_module("dynamics")
        .with_parameter("m", 2.0, "kg")
        .with_parameter("g", 9.8, "m/s^2")
        .with_object(InputObject::new("ball").with_mass(2.0).with_position(0.0, 100.0, 0.0))
        .with_simulation(SimulationConfig {
            duration: 1.0,
            ..SimulationConfig::default()
        })
}

#[test]
fn scenario_a_free_fall() {
    let report = Pipeline::default().run(&free_fall()).unwrap();

    assert_eq!(report.run.character, PhysicsCharacter::MixedKinematics);
    assert!(report.run.is_completed());

    let first = report.run.series.first().unwrap();
    let last = report.run.series.last().unwrap();
    assert!((last.time - 1.0).abs() < 1e-9);

    let vy = last.entities[0].velocity.y;
    assert!(((vy + 9.8) / 9.8).abs() < 0.01, "vy = {vy}");

    let drift = (last.energy.total - first.energy.total).abs() / first.energy.total.abs();
    assert!(drift < 0.01, "energy drift {drift}");
    assert!(report.result.conservation.iter().all(|c| c.passed));
    assert!(report.success());
}

// ============================================================================
// Scenario B: undamped spring, k = 100 N/m, m = 0.5 kg, x0 = 0.1 m
// ============================================================================

fn spring() -> ProblemInput {
    ProblemInput::new("")
        .with_module("oscillation")
        .with_parameter("k", 100.0, "N/m")
        .with_parameter("m", 0.5, "kg")
        .with_parameter("x0", 0.1, "m")
        .with_parameter("v0", 0.0, "m/s")
        .with_simulation(SimulationConfig {
            duration: 0.5,
            time_step: 0.001,
            output_stride: 1,
            adaptive_stepping: false,
            ..SimulationConfig::default()
        })
}

#[test]
fn scenario_b_spring_period() {
    let ir = build(&spring());
    assert!(IrValidator::new().validate(&ir).can_run());

    let run = SimEngine::new(&ir).unwrap().run().unwrap();
    assert_eq!(run.character, PhysicsCharacter::Oscillation);
    assert!(run.is_completed());
    // Stride 1: every accepted step is sampled, plus t = 0.
    assert_eq!(run.series.len(), 501);

    let crossings: Vec<f64> = run
        .events
        .iter()
        .filter(|e| e.kind == EventKind::ZeroCrossing)
        .map(|e| e.time)
        .collect();
    assert!(crossings.len() >= 2, "crossings: {crossings:?}");

    let expected = 2.0 * std::f64::consts::PI * (0.5_f64 / 100.0).sqrt();
    let period = 2.0 * (crossings[1] - crossings[0]);
    assert!(((period - expected) / expected).abs() < 0.01, "period {period}");

    let first = run.series.first().unwrap().energy.total;
    let worst = run
        .series
        .samples()
        .iter()
        .map(|s| (s.energy.total - first).abs() / first)
        .fold(0.0, f64::max);
    assert!(worst < 0.01, "energy drift {worst}");
}

#[test]
fn scenario_b_extra_detector_agrees() {
    struct Shared(std::sync::Arc<std::sync::Mutex<EventDetector>>);
    impl physir::engine::StepObserver for Shared {
        fn name(&self) -> &'static str {
            "shared"
        }
        fn observe(&mut self, record: &physir::engine::StepRecord<'_>) -> usize {
            self.0.lock().unwrap().observe(record)
        }
    }

    let detector = std::sync::Arc::new(std::sync::Mutex::new(EventDetector::new()));
    let ir = build(&spring());
    let run = SimEngine::new(&ir)
        .unwrap()
        .with_observer(Box::new(Shared(detector.clone())))
        .run()
        .unwrap();
    let extra = detector.lock().unwrap().events().to_vec();
    assert_eq!(extra, run.events);
}

// ============================================================================
// Scenario C: bare kinematics parameters, no declared module
// ============================================================================

#[test]
fn scenario_c_generic_module() {
    let input = ProblemInput::new("")
        .with_parameter("v0", 10.0, "m/s")
        .with_parameter("a", 2.0, "m/s^2")
        .with_parameter("t", 5.0, "s");
    let ir = build(&input);
    assert!(!ir.modules.is_empty());

    let report = IrValidator::new().validate(&ir);
    assert!(report.is_valid(ValidationCategory::Structural));
    assert!(report.is_valid(ValidationCategory::Equations));
    assert!(report.can_run());
}

// ============================================================================
// Scenario D: an equation naming an unknown variable
// ============================================================================

#[test]
fn scenario_d_unresolved_variable() {
    let mut ir = build(&free_fall());
    ir.modules[0].equations.push(Equation {
        id: "extra".into(),
        kind: EquationKind::Algebraic,
        expression: "F = m * a + b_missing".into(),
        variables: Vec::new(),
        parameters: Vec::new(),
        order: None,
        linear: true,
        physical_meaning: String::new(),
    });

    let report = IrValidator::with_passes(ValidationPasses::EQUATIONS).validate(&ir);
    let errors: Vec<_> = report.errors().collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, "IR-E03");
    assert_eq!(errors[0].subject.as_deref(), Some("b_missing"));
    assert!(errors[0].suggestion.is_some());
    assert!(!report.can_run());

    assert!(errors[0].to_string().contains("b_missing"));
    assert_eq!(report.blocking_errors().len(), 1);
}
