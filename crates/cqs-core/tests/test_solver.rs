//! Tests for the combination solver against dense references.

use num_complex::Complex64;

use cqs_core::overlap::ExactEstimator;
use cqs_core::{
    AnsatzPowers, AuxiliarySystem, CirculantModel, CombinationSolver, CqsError, DenseState,
    ErrorKind, OverlapEstimator, SolverStrategy, reconstruct_solution, required_shift,
    residual_norm_sqr,
};

fn system_for(
    model: &CirculantModel,
    state: &DenseState,
    threshold: u32,
) -> (AnsatzPowers, AuxiliarySystem) {
    let ansatz = AnsatzPowers::symmetric(threshold);
    let table = ExactEstimator::new(state.clone())
        .populate(required_shift(model, &ansatz))
        .unwrap();
    let sys = AuxiliarySystem::build(model, &ansatz, &table).unwrap();
    (ansatz, sys)
}

/// Real, non-symmetric right-hand side on 16 entries.
fn bumpy_state() -> DenseState {
    let raw: Vec<f64> = (0..16).map(|i| 1.0 + 0.5 * (i as f64 * 0.7).sin()).collect();
    let norm = raw.iter().map(|v| v * v).sum::<f64>().sqrt();
    DenseState::from_real(&raw.iter().map(|v| v / norm).collect::<Vec<_>>()).unwrap()
}

#[test]
fn qp_and_eigen_agree_on_well_conditioned_systems() {
    let model = CirculantModel::heat_transfer(1.0);
    let (_, sys) = system_for(&model, &bumpy_state(), 2);

    let qp = CombinationSolver::default().solve(&sys).unwrap();
    let eig = CombinationSolver::new(SolverStrategy::eigen())
        .solve(&sys)
        .unwrap();
    assert!((qp.loss - eig.loss).abs() < 1e-9);
    for (a, b) in qp.coefficients.iter().zip(&eig.coefficients) {
        assert!((a - b).norm() < 1e-6);
    }
}

#[test]
fn loss_equals_residual_for_real_problems() {
    let model = CirculantModel::heat_transfer(0.5);
    let state = bumpy_state();
    for threshold in 0..=3 {
        let (ansatz, sys) = system_for(&model, &state, threshold);
        let res = CombinationSolver::default().solve(&sys).unwrap();
        let x = reconstruct_solution(state.amplitudes(), &ansatz, &res.coefficients).unwrap();
        let residual = residual_norm_sqr(&model, &x, state.amplitudes());
        assert!(
            (res.loss - residual).abs() < 1e-8,
            "T = {threshold}: loss {} vs residual {residual}",
            res.loss
        );
    }
}

#[test]
fn loss_does_not_increase_with_threshold() {
    let model = CirculantModel::heat_transfer(0.2);
    let state = bumpy_state();
    let mut previous = f64::INFINITY;
    for threshold in 0..=4 {
        let (_, sys) = system_for(&model, &state, threshold);
        let loss = CombinationSolver::default().solve(&sys).unwrap().loss;
        assert!(loss <= previous + 1e-9, "T = {threshold}: {loss} > {previous}");
        previous = loss;
    }
}

#[test]
fn full_window_solves_the_system() {
    // With every shift available the ansatz spans C⁻¹b exactly.
    let model = CirculantModel::heat_transfer(1.0);
    let state = DenseState::from_real(&[0.5, 0.5, 0.5, -0.5]).unwrap();
    let ansatz = AnsatzPowers::new(vec![0, 1, 2, 3]).unwrap();
    let table = ExactEstimator::new(state.clone())
        .populate(required_shift(&model, &ansatz))
        .unwrap();
    let sys = AuxiliarySystem::build(&model, &ansatz, &table).unwrap();
    let res = CombinationSolver::new(SolverStrategy::eigen())
        .solve(&sys)
        .unwrap();
    assert!(res.loss < 1e-9);

    let x = reconstruct_solution(state.amplitudes(), &ansatz, &res.coefficients).unwrap();
    let cx = model.apply(&x);
    for (lhs, rhs) in cx.iter().zip(state.amplitudes()) {
        assert!((lhs - rhs).norm() < 1e-6);
    }
}

#[test]
fn coefficients_pair_real_and_imaginary_halves() {
    // W = I, r = [1, 2, 3, 4] → x = r, α = [1 + 3i, 2 + 4i].
    let sys = AuxiliarySystem::from_parts(
        nalgebra::DMatrix::identity(4, 4),
        nalgebra::DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]),
    )
    .unwrap();
    let res = CombinationSolver::default().solve(&sys).unwrap();
    assert!((res.coefficients[0] - Complex64::new(1.0, 3.0)).norm() < 1e-9);
    assert!((res.coefficients[1] - Complex64::new(2.0, 4.0)).norm() < 1e-9);
    // 30 − 60 + 1
    assert!((res.loss - 29.0).abs() < 1e-9);
}

#[test]
fn negative_definite_w_yields_its_stationary_point() {
    // W = −I, r = [1, 0] → x = [−1, 0], |1 + 2 − 1| = 2.
    let sys = AuxiliarySystem::from_parts(
        -nalgebra::DMatrix::identity(2, 2),
        nalgebra::DVector::from_vec(vec![1.0, 0.0]),
    )
    .unwrap();
    let res = CombinationSolver::default().solve(&sys).unwrap();
    assert!((res.coefficients[0] - Complex64::new(-1.0, 0.0)).norm() < 1e-9);
    assert!((res.loss - 2.0).abs() < 1e-9);
}

#[test]
fn singular_unregularised_w_is_an_optimization_error() {
    let sys = AuxiliarySystem::from_parts(
        nalgebra::DMatrix::zeros(2, 2),
        nalgebra::DVector::from_vec(vec![1.0, 0.0]),
    )
    .unwrap();
    let solver = CombinationSolver::new(SolverStrategy::Qp {
        kkt_reg: 0.0,
        refine_steps: 3,
    });
    let err = solver.solve(&sys).unwrap_err();
    assert!(matches!(err, CqsError::Optimization(_)));
    assert_eq!(err.kind(), ErrorKind::Optimization);
}

#[test]
fn regularisation_scales_with_large_coefficients() {
    // Uniform b makes W rank deficient; rounding at |c| ~ 1e6 dwarfs an
    // absolute 1e-12 shift.
    let uniform = DenseState::uniform(3);
    for scale in [1.0, 1e4, 1e6] {
        let model = CirculantModel::new(
            3,
            vec![0, 1, -1],
            vec![
                Complex64::new(-2.2 * scale, 0.0),
                Complex64::new(scale, 0.0),
                Complex64::new(scale, 0.0),
            ],
        )
        .unwrap();
        let (_, sys) = system_for(&model, &uniform, 3);
        let res = CombinationSolver::default()
            .solve(&sys)
            .unwrap_or_else(|e| panic!("scale {scale:e}: {e}"));
        assert!(res.loss < 1e-8, "scale {scale:e}: loss {}", res.loss);
        let total: Complex64 = res.coefficients.iter().sum();
        assert!((total * (-0.2 * scale) - 1.0).norm() < 1e-6);
    }
}
