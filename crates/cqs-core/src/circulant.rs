//! Circulant matrices as weighted sums of cyclic shifts.

use std::collections::BTreeMap;

use nalgebra::DMatrix;
use num_complex::Complex64;
use serde::Serialize;

use crate::error::{CqsError, CqsResult};
use crate::permutation::{self, source_index};

/// `C = Σ_m c_m Q^{p_m}`.
///
/// Powers may repeat and take any sign. The model is immutable; the dense
/// matrix is rebuilt on every [`matrix`](Self::matrix) call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CirculantModel {
    term_number: usize,
    powers: Vec<i64>,
    coeffs: Vec<Complex64>,
}

impl CirculantModel {
    /// Create a model with `term_number` terms.
    pub fn new(term_number: usize, powers: Vec<i64>, coeffs: Vec<Complex64>) -> CqsResult<Self> {
        if term_number == 0 {
            return Err(CqsError::InvalidModel(
                "a circulant model needs at least one term".into(),
            ));
        }
        if powers.len() != term_number || coeffs.len() != term_number {
            return Err(CqsError::InvalidModel(format!(
                "term_number is {term_number} but got {} powers and {} coefficients",
                powers.len(),
                coeffs.len()
            )));
        }
        if coeffs.iter().any(|c| !c.is_finite()) {
            return Err(CqsError::InvalidModel("coefficients must be finite".into()));
        }
        Ok(Self {
            term_number,
            powers,
            coeffs,
        })
    }

    /// Build from aligned `(power, coefficient)` pairs.
    pub fn from_terms(terms: impl IntoIterator<Item = (i64, Complex64)>) -> CqsResult<Self> {
        let (powers, coeffs): (Vec<_>, Vec<_>) = terms.into_iter().unzip();
        Self::new(powers.len(), powers, coeffs)
    }

    /// The identity operator.
    pub fn identity() -> Self {
        Self {
            term_number: 1,
            powers: vec![0],
            coeffs: vec![Complex64::new(1.0, 0.0)],
        }
    }

    /// Discretised 1-D heat-transfer operator `(−2 − ξ)I + Q + Q^{−1}`.
    pub fn heat_transfer(xi: f64) -> Self {
        Self {
            term_number: 3,
            powers: vec![0, 1, -1],
            coeffs: vec![
                Complex64::new(-2.0 - xi, 0.0),
                Complex64::new(1.0, 0.0),
                Complex64::new(1.0, 0.0),
            ],
        }
    }

    pub fn term_number(&self) -> usize {
        self.term_number
    }

    /// Shift power of each term.
    pub fn pows(&self) -> &[i64] {
        &self.powers
    }

    /// Coefficient of each term.
    pub fn coeffs(&self) -> &[Complex64] {
        &self.coeffs
    }

    /// Iterate `(power, coefficient)` pairs.
    pub fn terms(&self) -> impl Iterator<Item = (i64, Complex64)> + '_ {
        self.powers.iter().copied().zip(self.coeffs.iter().copied())
    }

    /// `max(powers) − min(powers)`.
    pub fn span(&self) -> i64 {
        let max = self.powers.iter().max().copied().unwrap_or(0);
        let min = self.powers.iter().min().copied().unwrap_or(0);
        max - min
    }

    /// Coefficients summed per distinct power.
    pub fn coefficient_map(&self) -> BTreeMap<i64, Complex64> {
        let mut map = BTreeMap::new();
        for (p, c) in self.terms() {
            *map.entry(p).or_insert(Complex64::new(0.0, 0.0)) += c;
        }
        map
    }

    /// Dense `dim × dim` matrix.
    pub fn matrix(&self, dim: usize) -> DMatrix<Complex64> {
        let mut m = DMatrix::from_element(dim, dim, Complex64::new(0.0, 0.0));
        for (p, c) in self.terms() {
            for k in 0..dim {
                m[(k, source_index(k, p, dim))] += c;
            }
        }
        m
    }

    /// `C·v` in `O(K·dim)`.
    pub fn apply(&self, v: &[Complex64]) -> Vec<Complex64> {
        let mut out = vec![Complex64::new(0.0, 0.0); v.len()];
        for (p, c) in self.terms() {
            for (o, s) in out.iter_mut().zip(permutation::shift(v, p)) {
                *o += c * s;
            }
        }
        out
    }

    /// `σ_max / σ_min` of the dense matrix; infinite when singular.
    pub fn condition_number(&self, dim: usize) -> CqsResult<f64> {
        if dim == 0 {
            return Err(CqsError::Configuration(
                "condition number of an empty matrix".into(),
            ));
        }
        let sv = self.matrix(dim).singular_values();
        let max = sv.max();
        let min = sv.min();
        if min <= 1e-12 * max {
            return Ok(f64::INFINITY);
        }
        Ok(max / min)
    }
}
