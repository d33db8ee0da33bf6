//! Pipeline benchmarks.
//!
//! Run with: cargo criterion

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use physir::engine::SimEngine;
use physir::prelude::*;
use physir::verify::ResultValidator;

fn particles(n: usize) -> ProblemInput {
    (0..n).fold(
        ProblemInput::new("")
            .with_module("dynamics")
            .with_parameter("m", 1.0, "kg")
            .with_parameter("g", 9.8, "m/s^2"),
        |input, i| {
            let x = i as f64;
            input.with_object(
                InputObject::new(format!("p{i}"))
                    .with_position(x, 10.0 + x, 0.0)
                    .with_velocity(1.0, 2.0, 0.0),
            )
        },
    )
}

/// Engine loop: 1000 fixed steps for growing entity counts.
fn bench_engine_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_loop");
    group.sample_size(50);
    group.confidence_level(0.95);

    let library = ModuleLibrary::standard();
    for n in [1usize, 10, 100] {
        let ir = IrBuilder::new(&library)
            .with_simulation(SimulationConfig {
                duration: 1.0,
                time_step: 0.001,
                adaptive_stepping: false,
                ..SimulationConfig::default()
            })
            .build(&particles(n));
        group.bench_with_input(BenchmarkId::new("entities", n), &ir, |b, ir| {
            b.iter(|| {
                let run = SimEngine::new(ir).map(SimEngine::run);
                black_box(run.is_ok())
            });
        });
    }
    group.finish();
}

/// Build and validate only.
fn bench_build_and_validate(c: &mut Criterion) {
    let library = ModuleLibrary::standard();
    let input = particles(5);
    c.bench_function("build_validate", |b| {
        b.iter(|| {
            let ir = IrBuilder::new(&library).build(black_box(&input));
            black_box(IrValidator::new().validate(&ir).score)
        });
    });
}

/// Result verification over a recorded run.
fn bench_verify(c: &mut Criterion) {
    let pipeline = Pipeline::new(RunConfig::builder().duration(1.0).output_stride(1).build());
    let ir = pipeline.build(&particles(10));
    let Ok(Ok(run)) = SimEngine::new(&ir).map(SimEngine::run) else {
        return;
    };
    let validator = ResultValidator::default();
    c.bench_function("verify_run", |b| {
        b.iter(|| black_box(validator.validate(&ir, &run).score));
    });
}

criterion_group!(benches, bench_engine_loop, bench_build_and_validate, bench_verify);
criterion_main!(benches);
