//! Overlaps of a sparse state, iterating only over its support.

use num_complex::Complex64;

use crate::error::CqsResult;
use crate::permutation::source_index;
use crate::state::SparseState;

use super::OverlapEstimator;

#[derive(Debug, Clone)]
pub struct SparseEstimator {
    state: SparseState,
}

impl SparseEstimator {
    pub fn new(state: SparseState) -> Self {
        Self { state }
    }
}

impl OverlapEstimator for SparseEstimator {
    fn name(&self) -> &'static str {
        "sparse"
    }

    fn dim(&self) -> usize {
        self.state.dim()
    }

    fn estimate(&mut self, shift: i64) -> CqsResult<Complex64> {
        let n = self.state.dim();
        Ok(self
            .state
            .iter()
            .map(|(i, bi)| bi.conj() * self.state.get(source_index(i, shift, n)))
            .sum())
    }
}
