//! Tests for the cyclic shift operator and circulant models.

use nalgebra::DVector;
use num_complex::Complex64;
use proptest::prelude::*;

use cqs_core::permutation::{permutation_matrix, shift};
use cqs_core::{CirculantModel, CqsError, ErrorKind};

// ---------------------------------------------------------------------------
// PermutationOperator
// ---------------------------------------------------------------------------

#[test]
fn shift_by_one_moves_basis_vector_forward() {
    let q = permutation_matrix(4, 1);
    for k in 0..4 {
        let mut e = DVector::zeros(4);
        e[k] = 1.0;
        let moved = &q * e;
        let mut expected = DVector::zeros(4);
        expected[(k + 1) % 4] = 1.0;
        assert_eq!(moved, expected, "Q e_{k}");
    }
}

#[test]
fn explicit_four_by_four_layout() {
    let q = permutation_matrix(4, 1);
    // Q[k][(k − 1) mod 4] = 1
    let expected = [[0., 0., 0., 1.], [1., 0., 0., 0.], [0., 1., 0., 0.], [0., 0., 1., 0.]];
    for (k, row) in expected.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            assert_eq!(q[(k, j)], v);
        }
    }
}

#[test]
fn negative_power_is_inverse() {
    let q = permutation_matrix(6, 2);
    let q_inv = permutation_matrix(6, -2);
    assert_eq!(&q * &q_inv, nalgebra::DMatrix::identity(6, 6));
    assert_eq!(q.transpose(), q_inv);
}

proptest! {
    #[test]
    fn is_permutation_matrix(dim in 1usize..12, p in 0i64..12) {
        let p = p % dim as i64;
        let q = permutation_matrix(dim, p);
        for k in 0..dim {
            prop_assert_eq!(q.row(k).sum(), 1.0);
            prop_assert_eq!(q.column(k).sum(), 1.0);
        }
        prop_assert!(q.iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn powers_compose(dim in 1usize..10, a in -20i64..20, b in -20i64..20) {
        let lhs = permutation_matrix(dim, a) * permutation_matrix(dim, b);
        prop_assert_eq!(lhs, permutation_matrix(dim, a + b));
    }

    #[test]
    fn vector_shift_agrees_with_matrix(values in prop::collection::vec(-5.0f64..5.0, 1..10), p in -15i64..15) {
        let dense = permutation_matrix(values.len(), p) * DVector::from_column_slice(&values);
        prop_assert_eq!(shift(&values, p), dense.as_slice().to_vec());
    }
}

// ---------------------------------------------------------------------------
// CirculantModel
// ---------------------------------------------------------------------------

#[test]
fn mismatched_lengths_are_configuration_errors() {
    let err = CirculantModel::new(3, vec![0, 1, -1], vec![Complex64::new(1.0, 0.0)]).unwrap_err();
    assert!(matches!(err, CqsError::InvalidModel(_)));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn model_matrix_is_weighted_sum_of_shifts() {
    let coeffs = vec![
        Complex64::new(-2.2, 0.0),
        Complex64::new(1.0, 0.5),
        Complex64::new(1.0, -0.5),
    ];
    let model = CirculantModel::new(3, vec![0, 1, -1], coeffs.clone()).unwrap();
    let m = model.matrix(5);
    for k in 0..5 {
        for j in 0..5 {
            let expected: Complex64 = model
                .pows()
                .iter()
                .zip(&coeffs)
                .map(|(&p, &c)| c * permutation_matrix(5, p)[(k, j)])
                .sum();
            assert_eq!(m[(k, j)], expected);
        }
    }
    assert_eq!(model.coeffs(), coeffs.as_slice());
}

#[test]
fn repeated_and_wrapping_powers() {
    let one = Complex64::new(1.0, 0.0);
    // Q^4 on dimension 4 is the identity.
    let model = CirculantModel::from_terms([(4, one), (0, one)]).unwrap();
    let m = model.matrix(4);
    for k in 0..4 {
        assert_eq!(m[(k, k)], Complex64::new(2.0, 0.0));
    }
}
