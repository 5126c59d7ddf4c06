//! Cyclic shift operator `Q^p`.
//!
//! `(Q^p)[k][(k − p) mod dim] = 1`, so `Q^p e_j = e_{(j + p) mod dim}` and
//! `(Q^p v)[k] = v[(k − p) mod dim]`. Negative and out-of-range powers wrap.

use nalgebra::DMatrix;

/// Row index `k` maps to column `(k − p) mod dim`.
#[inline]
pub fn source_index(k: usize, power: i64, dim: usize) -> usize {
    (k as i64 - power).rem_euclid(dim as i64) as usize
}

/// Dense `dim × dim` matrix of `Q^power`.
pub fn permutation_matrix(dim: usize, power: i64) -> DMatrix<f64> {
    let mut q = DMatrix::zeros(dim, dim);
    for k in 0..dim {
        q[(k, source_index(k, power, dim))] = 1.0;
    }
    q
}

/// Apply `Q^power` to a vector without materialising the matrix.
pub fn shift<T: Copy>(v: &[T], power: i64) -> Vec<T> {
    let dim = v.len();
    (0..dim).map(|k| v[source_index(k, power, dim)]).collect()
}
