//! Monte-Carlo overlaps drawn from the Born distribution of `b`.
//!
//! With `i ~ |b_i|²`, the mean of `b[(i − k) mod n] / b[i]` is an unbiased
//! estimate of `⟨b|Q^k|b⟩` with standard error `∝ 1/√shots`.

use num_complex::Complex64;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use tracing::trace;

use crate::error::{CqsError, CqsResult};
use crate::permutation::source_index;
use crate::state::DenseState;

use super::OverlapEstimator;

#[derive(Debug, Clone)]
pub struct SampledEstimator {
    state: DenseState,
    shots: u32,
    born: WeightedIndex<f64>,
    rng: StdRng,
}

impl SampledEstimator {
    /// Sampler seeded from OS entropy.
    pub fn new(state: DenseState, shots: u32) -> CqsResult<Self> {
        Self::with_rng(state, shots, StdRng::from_entropy())
    }

    /// Reproducible sampler.
    pub fn seeded(state: DenseState, shots: u32, seed: u64) -> CqsResult<Self> {
        Self::with_rng(state, shots, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(state: DenseState, shots: u32, rng: StdRng) -> CqsResult<Self> {
        if shots == 0 {
            return Err(CqsError::Configuration(
                "sampled overlaps need at least one shot".into(),
            ));
        }
        let born = WeightedIndex::new(state.amplitudes().iter().map(Complex64::norm_sqr))
            .map_err(|e| CqsError::InvalidState(format!("cannot sample |b|²: {e}")))?;
        Ok(Self {
            state,
            shots,
            born,
            rng,
        })
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }
}

impl OverlapEstimator for SampledEstimator {
    fn name(&self) -> &'static str {
        "sampled"
    }

    fn dim(&self) -> usize {
        self.state.dim()
    }

    fn estimate(&mut self, shift: i64) -> CqsResult<Complex64> {
        let b = self.state.amplitudes();
        let n = b.len();
        let mut acc = Complex64::new(0.0, 0.0);
        for _ in 0..self.shots {
            let i = self.born.sample(&mut self.rng);
            if b[i].norm_sqr() == 0.0 {
                return Err(CqsError::ZeroAmplitude { index: i });
            }
            acc += b[source_index(i, shift, n)] / b[i];
        }
        let mean = acc / f64::from(self.shots);
        trace!(shift, re = mean.re, im = mean.im, "sampled overlap");
        Ok(mean)
    }
}
