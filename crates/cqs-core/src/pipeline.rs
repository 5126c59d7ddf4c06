//! Threshold sweeps: overlaps, assembly and solve, in sequence.

use num_complex::Complex64;
use tracing::{info, instrument, warn};

use crate::ansatz::AnsatzPowers;
use crate::auxiliary::{AuxiliarySystem, required_shift};
use crate::circulant::CirculantModel;
use crate::error::{CqsError, CqsResult};
use crate::overlap::{OverlapSource, OverlapTable};
use crate::poll::CancellationToken;
use crate::solution::reconstruct_solution;
use crate::solver::{CombinationResult, CombinationSolver};

/// Everything produced for one truncation threshold.
#[derive(Debug, Clone)]
pub struct ThresholdOutcome {
    pub threshold: u32,
    pub ansatz: AnsatzPowers,
    pub overlaps: OverlapTable,
    pub system: AuxiliarySystem,
    pub result: CombinationResult,
    /// Access mode or backend name.
    pub access_mode: String,
    pub shots: Option<u32>,
}

impl ThresholdOutcome {
    /// `x = Σ_t α_t Q^{a_t} b`.
    pub fn solution(&self, b: &[Complex64]) -> CqsResult<Vec<Complex64>> {
        reconstruct_solution(b, &self.ansatz, &self.result.coefficients)
    }
}

/// Receives each completed threshold exactly once.
pub trait RecordSink {
    fn record(&mut self, outcome: &ThresholdOutcome) -> CqsResult<()>;
}

/// Drives overlap estimation, assembly and solving for a fixed model and `b`.
pub struct Orchestrator {
    model: CirculantModel,
    source: OverlapSource,
    solver: CombinationSolver,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(model: CirculantModel, source: OverlapSource) -> Self {
        Self {
            model,
            source,
            solver: CombinationSolver::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_solver(mut self, solver: CombinationSolver) -> Self {
        self.solver = solver;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn model(&self) -> &CirculantModel {
        &self.model
    }

    /// Token that aborts remote polling.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Solve with the symmetric window `[−threshold, threshold]`.
    pub async fn solve_threshold(&mut self, threshold: u32) -> CqsResult<ThresholdOutcome> {
        self.solve_ansatz(threshold, AnsatzPowers::symmetric(threshold))
            .await
    }

    /// Solve with an explicit ansatz; `threshold` is only recorded.
    #[instrument(skip(self, ansatz), fields(mode = %self.source.mode()))]
    pub async fn solve_ansatz(
        &mut self,
        threshold: u32,
        ansatz: AnsatzPowers,
    ) -> CqsResult<ThresholdOutcome> {
        let max_shift = required_shift(&self.model, &ansatz);
        let dim = self.source.dim();
        if max_shift >= dim {
            warn!(
                max_shift,
                dim, "required shift reaches the state dimension; shifts alias modulo dim"
            );
        }

        let overlaps = self.source.populate(max_shift, &self.cancel).await?;
        let system = AuxiliarySystem::build(&self.model, &ansatz, &overlaps)?;
        let result = self.solver.solve(&system)?;
        info!(threshold, loss = result.loss, "threshold solved");

        Ok(ThresholdOutcome {
            threshold,
            ansatz,
            overlaps,
            system,
            result,
            access_mode: self.source.mode(),
            shots: self.source.shots(),
        })
    }

    /// Solve each threshold in order, handing every outcome to `sink`.
    ///
    /// The first failure stops the sweep.
    pub async fn sweep(
        &mut self,
        thresholds: impl IntoIterator<Item = u32>,
        mut sink: Option<&mut dyn RecordSink>,
    ) -> CqsResult<Vec<ThresholdOutcome>> {
        let mut outcomes = Vec::new();
        for threshold in thresholds {
            if self.cancel.is_cancelled() {
                return Err(CqsError::PollingCancelled);
            }
            let outcome = self.solve_threshold(threshold).await?;
            if let Some(sink) = sink.as_mut() {
                sink.record(&outcome)?;
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    /// Smallest threshold in `0..=max_threshold` whose loss is at most
    /// `tolerance`, or `None` if the window never gets there.
    pub async fn minimal_threshold(
        &mut self,
        tolerance: f64,
        max_threshold: u32,
    ) -> CqsResult<Option<ThresholdOutcome>> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(CqsError::Configuration(format!(
                "loss tolerance must be finite and non-negative, got {tolerance}"
            )));
        }
        for threshold in 0..=max_threshold {
            if self.cancel.is_cancelled() {
                return Err(CqsError::PollingCancelled);
            }
            let outcome = self.solve_threshold(threshold).await?;
            if outcome.result.loss <= tolerance {
                return Ok(Some(outcome));
            }
        }
        Ok(None)
    }
}
