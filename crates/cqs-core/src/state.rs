//! Validated representations of `|b⟩`.

use num_complex::Complex64;
use rustc_hash::FxHashMap;
use serde::Serialize;

use cqs_hal::StatePreparation;

use crate::error::{CqsError, CqsResult};

/// Allowed deviation of `‖b‖²` from one.
pub const NORM_TOLERANCE: f64 = 1e-8;

fn check_norm(norm_sqr: f64) -> CqsResult<()> {
    if !norm_sqr.is_finite() || (norm_sqr - 1.0).abs() > NORM_TOLERANCE {
        return Err(CqsError::InvalidState(format!(
            "state must have unit norm, got ‖b‖² = {norm_sqr}"
        )));
    }
    Ok(())
}

/// Dense unit-norm amplitude vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseState {
    amplitudes: Vec<Complex64>,
}

impl DenseState {
    pub fn new(amplitudes: Vec<Complex64>) -> CqsResult<Self> {
        if amplitudes.is_empty() {
            return Err(CqsError::InvalidState("state vector is empty".into()));
        }
        check_norm(amplitudes.iter().map(Complex64::norm_sqr).sum())?;
        Ok(Self { amplitudes })
    }

    /// Real amplitudes.
    pub fn from_real(amplitudes: &[f64]) -> CqsResult<Self> {
        Self::new(amplitudes.iter().map(|&a| Complex64::new(a, 0.0)).collect())
    }

    /// Evaluate a preparation to its statevector.
    pub fn from_preparation(prep: &StatePreparation) -> CqsResult<Self> {
        Self::new(prep.statevector()?)
    }

    /// Uniform superposition over `num_qubits` qubits.
    pub fn uniform(num_qubits: u32) -> Self {
        let dim = 1usize << num_qubits;
        let a = Complex64::new(1.0 / (dim as f64).sqrt(), 0.0);
        Self {
            amplitudes: vec![a; dim],
        }
    }

    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    pub fn dim(&self) -> usize {
        self.amplitudes.len()
    }

    /// Sparse encoding keeping every non-zero amplitude.
    pub fn to_sparse(&self) -> SparseState {
        SparseState {
            dim: self.dim(),
            entries: self
                .amplitudes
                .iter()
                .enumerate()
                .filter(|(_, a)| a.norm_sqr() > 0.0)
                .map(|(i, &a)| (i, a))
                .collect(),
        }
    }
}

/// Index → amplitude map with a declared dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseState {
    dim: usize,
    entries: FxHashMap<usize, Complex64>,
}

impl SparseState {
    pub fn new(dim: usize, entries: impl IntoIterator<Item = (usize, Complex64)>) -> CqsResult<Self> {
        if dim == 0 {
            return Err(CqsError::InvalidState("sparse state dimension is zero".into()));
        }
        let mut map = FxHashMap::default();
        for (i, a) in entries {
            if i >= dim {
                return Err(CqsError::InvalidState(format!(
                    "sparse index {i} out of range for dimension {dim}"
                )));
            }
            if map.insert(i, a).is_some() {
                return Err(CqsError::InvalidState(format!(
                    "sparse index {i} given twice"
                )));
            }
        }
        check_norm(map.values().map(Complex64::norm_sqr).sum())?;
        Ok(Self { dim, entries: map })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of stored entries.
    pub fn support(&self) -> usize {
        self.entries.len()
    }

    /// Amplitude at `index`, zero when absent.
    pub fn get(&self, index: usize) -> Complex64 {
        self.entries
            .get(&index)
            .copied()
            .unwrap_or(Complex64::new(0.0, 0.0))
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Complex64)> + '_ {
        self.entries.iter().map(|(&i, &a)| (i, a))
    }

    /// Dense expansion.
    pub fn to_dense(&self) -> DenseState {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); self.dim];
        for (i, a) in self.iter() {
            amplitudes[i] = a;
        }
        DenseState { amplitudes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dense_validation() {
        assert!(DenseState::new(vec![]).is_err());
        assert!(DenseState::from_real(&[1.0, 1.0]).is_err());
        let s = 0.5_f64.sqrt();
        assert!(DenseState::from_real(&[s, s]).is_ok());
    }

    #[test]
    fn test_uniform_norm() {
        let u = DenseState::uniform(3);
        assert_eq!(u.dim(), 8);
        let norm: f64 = u.amplitudes().iter().map(Complex64::norm_sqr).sum();
        assert!((norm - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sparse_validation() {
        let one = Complex64::new(1.0, 0.0);
        assert!(SparseState::new(0, []).is_err());
        assert!(SparseState::new(4, [(4, one)]).is_err());
        assert!(SparseState::new(4, [(1, one), (1, one)]).is_err());
        let s = SparseState::new(4, [(2, one)]).unwrap();
        assert_eq!(s.support(), 1);
        assert_eq!(s.get(0), Complex64::new(0.0, 0.0));
        assert_eq!(s.to_dense().amplitudes()[2], one);
    }

    #[test]
    fn test_sparse_round_trip_drops_zeros() {
        let dense = DenseState::from_real(&[0.6, 0.0, 0.8, 0.0]).unwrap();
        let sparse = dense.to_sparse();
        assert_eq!(sparse.support(), 2);
        assert_eq!(sparse.to_dense(), dense);
    }
}
