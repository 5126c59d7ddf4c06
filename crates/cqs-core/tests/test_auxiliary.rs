//! Tests for auxiliary-system assembly.

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use cqs_core::overlap::ExactEstimator;
use cqs_core::{
    AnsatzPowers, AuxiliarySystem, CirculantModel, CombinationSolver, DenseState,
    OverlapEstimator, OverlapTable, required_shift,
};

fn random_complex(rng: &mut StdRng) -> Complex64 {
    Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
}

fn random_model(rng: &mut StdRng, terms: usize) -> CirculantModel {
    CirculantModel::from_terms((0..terms).map(|_| (rng.gen_range(-3..=3), random_complex(rng))))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn w_is_symmetric_for_arbitrary_overlaps(seed in any::<u64>(), terms in 1usize..4, t in 0u32..3) {
        let mut rng = StdRng::seed_from_u64(seed);
        let model = random_model(&mut rng, terms);
        let ansatz = AnsatzPowers::symmetric(t);
        // Independent values per sign: no conjugate symmetry at all.
        let table = OverlapTable::try_from_fn(required_shift(&model, &ansatz), |_| {
            Ok(random_complex(&mut rng))
        })
        .unwrap();

        let sys = AuxiliarySystem::build(&model, &ansatz, &table).unwrap();
        let n = 2 * ansatz.len();
        prop_assert_eq!(sys.w().shape(), (n, n));
        prop_assert_eq!(sys.r().len(), n);
        prop_assert_eq!(sys.w(), &sys.w().transpose());
    }
}

#[test]
fn exact_gram_is_already_hermitian() {
    let mut rng = StdRng::seed_from_u64(3);
    let amplitudes: Vec<Complex64> = (0..8).map(|_| random_complex(&mut rng)).collect();
    let norm = amplitudes.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
    let state = DenseState::new(amplitudes.iter().map(|a| a / norm).collect()).unwrap();

    let model = random_model(&mut rng, 3);
    let ansatz = AnsatzPowers::symmetric(1);
    let table = ExactEstimator::new(state.clone())
        .populate(required_shift(&model, &ansatz))
        .unwrap();
    let sys = AuxiliarySystem::build(&model, &ansatz, &table).unwrap();

    // Direct V[t1,t2] = ⟨C Q^{a1} b | C Q^{a2} b⟩ from dense vectors.
    let b = state.amplitudes();
    let shifted: Vec<Vec<Complex64>> = ansatz
        .iter()
        .map(|a| model.apply(&cqs_core::permutation::shift(b, a)))
        .collect();
    let t = ansatz.len();
    for i in 0..t {
        for j in 0..t {
            let v: Complex64 = shifted[i]
                .iter()
                .zip(&shifted[j])
                .map(|(x, y)| x.conj() * y)
                .sum();
            assert!((sys.w()[(i, j)] - v.re).abs() < 1e-12);
            assert!((sys.w()[(i + t, j)] - v.im).abs() < 1e-12);
        }
        let q: Complex64 = b.iter().zip(&shifted[i]).map(|(x, y)| x.conj() * y).sum();
        assert!((sys.r()[i] - q.re).abs() < 1e-12);
        assert!((sys.r()[i + t] - q.im).abs() < 1e-12);
    }
}

#[test]
fn identity_model_single_power() {
    let table = OverlapTable::from_parts(vec![], vec![]).unwrap();
    let ansatz = AnsatzPowers::new(vec![0]).unwrap();
    assert_eq!(required_shift(&CirculantModel::identity(), &ansatz), 0);

    let sys = AuxiliarySystem::build(&CirculantModel::identity(), &ansatz, &table).unwrap();
    assert_eq!(sys.w(), &DMatrix::identity(2, 2));
    assert_eq!(sys.r_vec(), vec![1.0, 0.0]);

    let res = CombinationSolver::default().solve(&sys).unwrap();
    assert!(res.loss < 1e-12);
    assert!((res.coefficients[0] - Complex64::new(1.0, 0.0)).norm() < 1e-9);
}

// ---------------------------------------------------------------------------
// Round trip through the solver
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn injected_coefficients_are_recovered(seed in any::<u64>(), t in 1usize..6) {
        let mut rng = StdRng::seed_from_u64(seed);
        let a = DMatrix::from_fn(t, t, |_, _| random_complex(&mut rng));
        let v = a.adjoint() * &a + DMatrix::identity(t, t);
        let alpha = DVector::from_fn(t, |_, _| random_complex(&mut rng));
        let q = &v * &alpha;

        let sys = AuxiliarySystem::from_gram(&v, &q).unwrap();
        let res = CombinationSolver::default().solve(&sys).unwrap();
        for (got, want) in res.coefficients.iter().zip(alpha.iter()) {
            prop_assert!((got - want).norm() < 1e-8, "got {got}, want {want}");
        }
    }
}
