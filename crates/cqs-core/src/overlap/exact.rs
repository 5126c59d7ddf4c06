//! Deterministic overlaps from a dense statevector.

use num_complex::Complex64;

use crate::error::CqsResult;
use crate::permutation::source_index;
use crate::state::DenseState;

use super::OverlapEstimator;

/// `⟨b|Q^k|b⟩ = Σ_i conj(b[i])·b[(i − k) mod n]`, `O(n)` per shift.
#[derive(Debug, Clone)]
pub struct ExactEstimator {
    state: DenseState,
}

impl ExactEstimator {
    pub fn new(state: DenseState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &DenseState {
        &self.state
    }
}

impl OverlapEstimator for ExactEstimator {
    fn name(&self) -> &'static str {
        "exact"
    }

    fn dim(&self) -> usize {
        self.state.dim()
    }

    fn estimate(&mut self, shift: i64) -> CqsResult<Complex64> {
        let b = self.state.amplitudes();
        let n = b.len();
        Ok(b.iter()
            .enumerate()
            .map(|(i, bi)| bi.conj() * b[source_index(i, shift, n)])
            .sum())
    }
}
