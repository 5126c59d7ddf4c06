//! Overlaps estimated with Hadamard tests on a remote backend.
//!
//! Each overlap part is one [`HadamardTest`] per shot budget. The real part
//! reads `p0 − p1` directly; the imaginary part comes from the S-gate test
//! and is stored negated.

use std::sync::Arc;

use futures::future::try_join_all;
use num_complex::Complex64;
use tracing::{debug, info, instrument};

use cqs_hal::{HadamardBackend, HadamardTest, PhaseSelector, StatePreparation};

use crate::error::{CqsError, CqsResult};
use crate::mitigation::NoiseHandling;
use crate::poll::{CancellationToken, PollPolicy, poll_to_completion};

use super::OverlapTable;

pub struct CircuitEstimator {
    backend: Arc<dyn HadamardBackend>,
    preparation: StatePreparation,
    shots: u32,
    noise: NoiseHandling,
    policy: PollPolicy,
}

impl CircuitEstimator {
    pub fn new(
        backend: Arc<dyn HadamardBackend>,
        preparation: StatePreparation,
        shots: u32,
    ) -> CqsResult<Self> {
        if shots == 0 {
            return Err(CqsError::Configuration(
                "circuit overlaps need at least one shot".into(),
            ));
        }
        preparation.validate()?;
        Ok(Self {
            backend,
            preparation,
            shots,
            noise: NoiseHandling::Raw,
            policy: PollPolicy::default(),
        })
    }

    pub fn with_noise_handling(mut self, noise: NoiseHandling) -> CqsResult<Self> {
        noise.validate()?;
        self.noise = noise;
        Ok(self)
    }

    pub fn with_poll_policy(mut self, policy: PollPolicy) -> CqsResult<Self> {
        policy.validate()?;
        self.policy = policy;
        Ok(self)
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn shots(&self) -> u32 {
        self.shots
    }

    pub fn dim(&self) -> usize {
        self.preparation.dim()
    }

    pub fn preparation(&self) -> &StatePreparation {
        &self.preparation
    }

    /// Submit every test for `±1..=max_shift` at once, then poll them all.
    #[instrument(skip(self, cancel), fields(backend = self.backend.name(), shots = self.shots))]
    pub async fn populate(
        &self,
        max_shift: usize,
        cancel: &CancellationToken,
    ) -> CqsResult<OverlapTable> {
        let budgets = self.noise.shot_budgets(self.shots);
        let shifts: Vec<i64> = (1..=max_shift as i64).flat_map(|k| [k, -k]).collect();

        let mut tests = Vec::with_capacity(shifts.len() * 2 * budgets.len());
        for &shift in &shifts {
            for phase in [PhaseSelector::Real, PhaseSelector::Imaginary] {
                for &shots in &budgets {
                    tests.push(HadamardTest::new(
                        self.preparation.clone(),
                        shift,
                        phase,
                        shots,
                    ));
                }
            }
        }
        if tests.is_empty() {
            return OverlapTable::from_parts(Vec::new(), Vec::new());
        }

        info!(tests = tests.len(), "submitting Hadamard tests");
        let jobs = try_join_all(tests.iter().map(|t| self.backend.submit(t))).await?;
        let results = poll_to_completion(self.backend.as_ref(), &jobs, &self.policy, cancel).await?;

        let mut expectations = Vec::with_capacity(results.len());
        for ((result, test), job) in results.iter().zip(&tests).zip(&jobs) {
            let (p0, p1) = result.counts.ancilla_probabilities().ok_or_else(|| {
                CqsError::RemoteExecution {
                    job: job.to_string(),
                    reason: "result has no ancilla counts".into(),
                }
            })?;
            expectations.push(self.noise.expectation(p0, p1));
            debug!(
                shift = test.shift,
                phase = %test.phase,
                shots = test.shots,
                p0,
                p1,
                "Hadamard test"
            );
        }

        let mut positive = Vec::with_capacity(max_shift);
        let mut negative = Vec::with_capacity(max_shift);
        let per_shift = 2 * budgets.len();
        for (&shift, chunk) in shifts.iter().zip(expectations.chunks(per_shift)) {
            let (re, im) = chunk.split_at(budgets.len());
            let z = Complex64::new(self.noise.combine(re)?, -self.noise.combine(im)?);
            if shift > 0 {
                positive.push(z);
            } else {
                negative.push(z);
            }
        }
        OverlapTable::from_parts(positive, negative)
    }
}

