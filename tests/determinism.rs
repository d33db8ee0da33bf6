//! Reproducibility: identical IR and configuration give a bit-identical
//! series.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use physir::engine::SimEngine;
use physir::prelude::*;

fn bouncing_ball() -> ProblemInput {
    ProblemInput::new("projectile")
        .with_module("dynamics")
        .with_parameter("m", 0.2, "kg")
        .with_parameter("g", 9.81, "m/s^2")
        .with_object(
            InputObject::new("ball")
                .with_mass(0.2)
                .with_position(0.0, 2.0, 0.0)
                .with_velocity(3.0, 4.0, 0.0),
        )
}

fn config() -> RunConfig {
    RunConfig::builder()
        .duration(2.0)
        .time_step(0.001)
        .adaptive(true)
        .output_stride(5)
        .build()
}

#[test]
fn test_repeated_runs_identical() {
    let pipeline = Pipeline::new(config());
    let a = pipeline.run(&bouncing_ball()).unwrap();
    let b = pipeline.run(&bouncing_ball()).unwrap();
    assert_eq!(a.fingerprint, b.fingerprint);
    assert_eq!(a.run.series, b.run.series);
    assert_eq!(a.run.events, b.run.events);
}

#[test]
fn test_ir_json_round_trip_reproduces_run() {
    let pipeline = Pipeline::new(config());
    let ir = pipeline.build(&bouncing_ball());
    let restored = PhysicsIr::from_json(&ir.to_json().unwrap()).unwrap();

    let original = SimEngine::new(&ir).unwrap().run().unwrap();
    let replayed = SimEngine::new(&restored).unwrap().run().unwrap();
    assert_eq!(
        original.series.fingerprint().unwrap(),
        replayed.series.fingerprint().unwrap()
    );
}

#[test]
fn test_batch_matches_sequential() {
    let pipeline = Pipeline::new(config());
    let inputs: Vec<ProblemInput> = (1..=4)
        .map(|i| {
            let h = f64::from(i);
            bouncing_ball().with_object(InputObject::new("second").with_position(1.0, h, 0.0))
        })
        .collect();

    let batch = pipeline.run_batch(&inputs);
    for (input, parallel) in inputs.iter().zip(&batch) {
        let sequential = pipeline.run(input).unwrap();
        assert_eq!(parallel.as_ref().unwrap().fingerprint, sequential.fingerprint);
    }
}

#[test]
fn test_different_inputs_differ() {
    let pipeline = Pipeline::new(config());
    let a = pipeline.run(&bouncing_ball()).unwrap();
    let c = pipeline
        .run(&ProblemInput::new("projectile")
            .with_module("dynamics")
            .with_object(InputObject::new("ball").with_position(0.0, 3.0, 0.0)))
        .unwrap();
    assert_ne!(a.fingerprint, c.fingerprint);
}
