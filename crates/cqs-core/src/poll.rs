//! Polling discipline for batches of remote Hadamard-test jobs.
//!
//! Every round pops each pending handle once, records completed results and
//! re-enqueues the rest. Only a round that completes nothing waits, with an
//! exponential backoff that a [`CancellationToken`] can interrupt.

use std::collections::VecDeque;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use cqs_hal::{ExecutionResult, HadamardBackend, JobId, JobStatus};

use crate::error::{CqsError, CqsResult};

pub use tokio_util::sync::CancellationToken;

/// Backoff applied between idle polling rounds.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// First wait after an idle round.
    pub initial: Duration,
    /// Growth factor per consecutive idle round.
    pub multiplier: f64,
    /// Upper bound on a single wait.
    pub max: Duration,
    /// Give up after this many consecutive idle rounds. `None` waits forever.
    pub max_idle_rounds: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            multiplier: 2.0,
            max: Duration::from_secs(3600),
            max_idle_rounds: None,
        }
    }
}

impl PollPolicy {
    #[must_use]
    pub fn with_max_idle_rounds(mut self, rounds: u32) -> Self {
        self.max_idle_rounds = Some(rounds);
        self
    }

    pub fn validate(&self) -> CqsResult<()> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(CqsError::Configuration(format!(
                "poll multiplier must be at least 1, got {}",
                self.multiplier
            )));
        }
        if self.initial > self.max {
            return Err(CqsError::Configuration(format!(
                "initial poll interval {:?} exceeds the cap {:?}",
                self.initial, self.max
            )));
        }
        Ok(())
    }

    fn next(&self, current: Duration) -> Duration {
        current.mul_f64(self.multiplier).min(self.max)
    }
}

/// Poll `jobs` until all complete; results are returned in submission order.
///
/// A job reporting `Failed` or `Cancelled` aborts the whole batch.
#[instrument(skip_all, fields(jobs = jobs.len(), backend = backend.name()))]
pub async fn poll_to_completion(
    backend: &dyn HadamardBackend,
    jobs: &[JobId],
    policy: &PollPolicy,
    cancel: &CancellationToken,
) -> CqsResult<Vec<ExecutionResult>> {
    let mut results: Vec<Option<ExecutionResult>> = vec![None; jobs.len()];
    let mut pending: VecDeque<usize> = (0..jobs.len()).collect();
    let mut delay = policy.initial;
    let mut idle_rounds = 0u32;

    while !pending.is_empty() {
        if cancel.is_cancelled() {
            return Err(CqsError::PollingCancelled);
        }

        let mut completed = 0usize;
        for _ in 0..pending.len() {
            let Some(idx) = pending.pop_front() else {
                break;
            };
            let job = &jobs[idx];
            match backend.status(job).await? {
                JobStatus::Completed => {
                    results[idx] = Some(backend.result(job).await?);
                    completed += 1;
                }
                JobStatus::Failed(msg) => {
                    return Err(CqsError::RemoteExecution {
                        job: job.to_string(),
                        reason: format!("failed: {msg}"),
                    });
                }
                JobStatus::Cancelled => {
                    return Err(CqsError::RemoteExecution {
                        job: job.to_string(),
                        reason: "cancelled".into(),
                    });
                }
                JobStatus::Queued | JobStatus::Running => pending.push_back(idx),
            }
        }

        if pending.is_empty() {
            break;
        }
        if completed > 0 {
            debug!(completed, remaining = pending.len(), "polling round");
            delay = policy.initial;
            idle_rounds = 0;
            continue;
        }

        idle_rounds += 1;
        if policy.max_idle_rounds.is_some_and(|max| idle_rounds >= max) {
            warn!(idle_rounds, remaining = pending.len(), "giving up on pending jobs");
            return Err(CqsError::PollingExhausted {
                rounds: idle_rounds,
            });
        }
        debug!(
            ?delay,
            idle_rounds,
            remaining = pending.len(),
            "no job finished, backing off"
        );
        tokio::select! {
            () = cancel.cancelled() => return Err(CqsError::PollingCancelled),
            () = tokio::time::sleep(delay) => {}
        }
        delay = policy.next(delay);
    }

    results
        .into_iter()
        .zip(jobs)
        .map(|(r, job)| {
            r.ok_or_else(|| CqsError::RemoteExecution {
                job: job.to_string(),
                reason: "no result recorded".into(),
            })
        })
        .collect()
}
