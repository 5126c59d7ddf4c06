//! Benchmarks for overlap population, assembly and solving
//!
//! Run with: cargo bench -p cqs-core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use cqs_core::overlap::ExactEstimator;
use cqs_core::{
    AnsatzPowers, AuxiliarySystem, CirculantModel, CombinationSolver, DenseState,
    OverlapEstimator, SolverStrategy, required_shift,
};

/// Benchmark exact overlap population
fn bench_exact_overlaps(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_overlaps");
    let model = CirculantModel::heat_transfer(0.2);

    for num_qubits in &[6u32, 10, 14] {
        let state = DenseState::uniform(*num_qubits);
        let max_shift = required_shift(&model, &AnsatzPowers::symmetric(4));
        group.bench_with_input(
            BenchmarkId::new("qubits", num_qubits),
            &state,
            |b, state| {
                let mut est = ExactEstimator::new(state.clone());
                b.iter(|| est.populate(black_box(max_shift)).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark W/r assembly for growing truncation thresholds
fn bench_assembly(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembly");
    let model = CirculantModel::heat_transfer(0.2);
    let state = DenseState::uniform(8);

    for threshold in &[1u32, 4, 8, 16] {
        let ansatz = AnsatzPowers::symmetric(*threshold);
        let table = ExactEstimator::new(state.clone())
            .populate(required_shift(&model, &ansatz))
            .unwrap();
        group.bench_with_input(
            BenchmarkId::new("threshold", threshold),
            &(ansatz, table),
            |b, (ansatz, table)| {
                b.iter(|| AuxiliarySystem::build(black_box(&model), ansatz, table).unwrap());
            },
        );
    }

    group.finish();
}

/// Benchmark both solver strategies
fn bench_solver(c: &mut Criterion) {
    let mut group = c.benchmark_group("solver");
    let model = CirculantModel::heat_transfer(1.0);
    let raw: Vec<f64> = (0..256).map(|i| 1.0 + (i as f64 * 0.3).cos()).collect();
    let norm = raw.iter().map(|v| v * v).sum::<f64>().sqrt();
    let state = DenseState::from_real(&raw.iter().map(|v| v / norm).collect::<Vec<_>>()).unwrap();

    let ansatz = AnsatzPowers::symmetric(8);
    let table = ExactEstimator::new(state)
        .populate(required_shift(&model, &ansatz))
        .unwrap();
    let system = AuxiliarySystem::build(&model, &ansatz, &table).unwrap();

    for (name, strategy) in [
        ("qp", SolverStrategy::default()),
        ("eigen", SolverStrategy::eigen()),
    ] {
        let solver = CombinationSolver::new(strategy);
        group.bench_function(name, |b| {
            b.iter(|| solver.solve(black_box(&system)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_exact_overlaps, bench_assembly, bench_solver);

criterion_main!(benches);
