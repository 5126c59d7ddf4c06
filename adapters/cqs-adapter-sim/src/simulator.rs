//! Simulator backend implementation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use cqs_hal::{
    BackendAvailability, BackendConfig, BackendFactory, Capabilities, ExecutionResult,
    HadamardBackend, HadamardJob, HadamardTest, HalError, HalResult, JobId, JobStatus,
};

use crate::hadamard::{ancilla_zero_probability, sample_ancilla};

/// Job data for the simulator.
struct SimJob {
    job: HadamardJob,
    result: Option<ExecutionResult>,
    /// Status queries left before the job reports `Completed`.
    polls_remaining: u32,
}

/// Local Hadamard-test simulator.
///
/// Evaluates the preparation to a statevector, computes the exact ancilla
/// probability and samples the requested number of shots. Jobs can be made
/// to linger in the queue for a fixed number of status queries so callers
/// exercise their polling path. A job is forgotten once its result or
/// terminal error has been fetched.
pub struct LocalSimulator {
    config: BackendConfig,
    capabilities: Capabilities,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
    submitted: AtomicUsize,
    rng: Mutex<StdRng>,
    latency_polls: u32,
}

impl LocalSimulator {
    /// Default register limit (excluding the ancilla).
    pub const DEFAULT_MAX_QUBITS: u32 = 20;

    /// Create a simulator with an entropy-seeded RNG and no queue latency.
    pub fn new() -> Self {
        Self::build(BackendConfig::new("local-sim"), StdRng::from_entropy(), 0)
    }

    /// Create a simulator with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(BackendConfig::new("local-sim"), StdRng::seed_from_u64(seed), 0)
    }

    /// Keep every job pending for `polls` status queries.
    #[must_use]
    pub fn with_latency_polls(mut self, polls: u32) -> Self {
        self.latency_polls = polls;
        self
    }

    /// Number of jobs submitted so far.
    pub fn job_count(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Jobs still held in memory.
    pub fn retained_jobs(&self) -> usize {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    fn build(config: BackendConfig, rng: StdRng, latency_polls: u32) -> Self {
        let max_qubits = config.extra_u64("max_qubits", u64::from(Self::DEFAULT_MAX_QUBITS)) as u32;
        Self {
            capabilities: Capabilities::simulator(config.name.clone(), max_qubits),
            config,
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
            submitted: AtomicUsize::new(0),
            rng: Mutex::new(rng),
            latency_polls,
        }
    }

    #[instrument(skip(self, test), fields(shift = test.shift, phase = %test.phase))]
    fn run_test(&self, test: &HadamardTest) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let b = test.preparation.statevector()?;
        let p0 = ancilla_zero_probability(&b, test.shift, test.phase);

        let counts = {
            let mut rng = self
                .rng
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            sample_ancilla(p0, test.shots, &mut *rng)?
        };
        debug!(p0, shots = test.shots, "Hadamard test simulated");

        Ok(ExecutionResult::new(counts, test.shots)
            .with_execution_time(start.elapsed().as_millis() as u64))
    }
}

impl Default for LocalSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HadamardBackend for LocalSimulator {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    async fn availability(&self) -> HalResult<BackendAvailability> {
        Ok(BackendAvailability::always_available())
    }

    async fn submit(&self, test: &HadamardTest) -> HalResult<JobId> {
        test.validate(&self.capabilities)?;

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let result = self.run_test(test)?;

        let mut job = HadamardJob::new(job_id.clone(), test.shift, test.phase, test.shots);
        if self.latency_polls == 0 {
            job.transition(JobStatus::Completed);
        }

        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        jobs.insert(
            job_id.0.clone(),
            SimJob {
                job,
                result: Some(result),
                polls_remaining: self.latency_polls,
            },
        );

        self.submitted.fetch_add(1, Ordering::Relaxed);
        debug!("Submitted job: {}", job_id);
        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;

        if !sim_job.job.status.is_terminal() {
            if sim_job.polls_remaining == 0 {
                sim_job.job.transition(JobStatus::Completed);
            } else {
                sim_job.polls_remaining -= 1;
                sim_job.job.transition(JobStatus::Running);
            }
        }
        Ok(sim_job.job.status.clone())
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sim_job = jobs
            .get(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        if sim_job.job.status.is_pending() {
            return Err(HalError::ResultNotReady(job_id.0.clone()));
        }

        let sim_job = jobs
            .remove(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        match sim_job.job.status {
            JobStatus::Completed => sim_job
                .result
                .ok_or_else(|| HalError::ResultNotReady(job_id.0.clone())),
            JobStatus::Cancelled => Err(HalError::JobCancelled),
            JobStatus::Failed(msg) => Err(HalError::JobFailed(msg)),
            JobStatus::Queued | JobStatus::Running => {
                Err(HalError::ResultNotReady(job_id.0.clone()))
            }
        }
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self
            .jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let sim_job = jobs
            .get_mut(&job_id.0)
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))?;
        sim_job.job.transition(JobStatus::Cancelled);
        Ok(())
    }
}

impl BackendFactory for LocalSimulator {
    fn from_config(config: BackendConfig) -> HalResult<Self> {
        let latency_polls = config.extra_u64("latency_polls", 0) as u32;
        let rng = match config.extra.get("seed").and_then(serde_json::Value::as_u64) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self::build(config, rng, latency_polls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cqs_hal::{PhaseSelector, StatePreparation};

    #[tokio::test]
    async fn test_simulator_capabilities() {
        let backend = LocalSimulator::new();
        let caps = backend.capabilities();
        assert!(caps.is_simulator);
        assert_eq!(caps.num_qubits, LocalSimulator::DEFAULT_MAX_QUBITS);
        assert!(backend.availability().await.unwrap().is_available);
    }

    #[tokio::test]
    async fn test_uniform_state_real_part_is_one() {
        let backend = LocalSimulator::with_seed(1);
        let test = HadamardTest::new(StatePreparation::uniform(3), 2, PhaseSelector::Real, 1000);
        let job_id = backend.submit(&test).await.unwrap();

        assert!(backend.status(&job_id).await.unwrap().is_success());
        let result = backend.result(&job_id).await.unwrap();
        assert_eq!(result.counts.get("0"), 1000);
        assert_eq!(result.counts.get("1"), 0);
    }

    #[tokio::test]
    async fn test_latency_keeps_job_pending() {
        let backend = LocalSimulator::with_seed(2).with_latency_polls(2);
        let test = HadamardTest::new(StatePreparation::uniform(2), 1, PhaseSelector::Imaginary, 64);
        let job_id = backend.submit(&test).await.unwrap();

        assert!(matches!(
            backend.result(&job_id).await,
            Err(HalError::ResultNotReady(_))
        ));
        assert!(backend.status(&job_id).await.unwrap().is_pending());
        assert!(backend.status(&job_id).await.unwrap().is_pending());
        assert!(backend.status(&job_id).await.unwrap().is_success());
        assert_eq!(backend.result(&job_id).await.unwrap().shots, 64);
    }

    #[tokio::test]
    async fn test_fetched_results_are_released() {
        let backend = LocalSimulator::with_seed(4).with_latency_polls(1);
        let test = HadamardTest::new(StatePreparation::uniform(2), 1, PhaseSelector::Real, 32);
        let job_id = backend.submit(&test).await.unwrap();

        assert!(backend.result(&job_id).await.is_err());
        assert_eq!(backend.retained_jobs(), 1);
        assert!(backend.status(&job_id).await.unwrap().is_pending());
        assert!(backend.status(&job_id).await.unwrap().is_success());
        backend.result(&job_id).await.unwrap();

        assert_eq!(backend.retained_jobs(), 0);
        assert_eq!(backend.job_count(), 1);
        assert!(matches!(
            backend.result(&job_id).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cancelled_job_has_no_result() {
        let backend = LocalSimulator::with_seed(3).with_latency_polls(5);
        let test = HadamardTest::new(StatePreparation::uniform(2), 1, PhaseSelector::Real, 16);
        let job_id = backend.submit(&test).await.unwrap();
        backend.cancel(&job_id).await.unwrap();

        assert_eq!(backend.status(&job_id).await.unwrap(), JobStatus::Cancelled);
        assert!(matches!(
            backend.result(&job_id).await,
            Err(HalError::JobCancelled)
        ));
    }

    #[tokio::test]
    async fn test_too_many_qubits() {
        let config = BackendConfig::new("tiny").with_extra("max_qubits", serde_json::json!(2));
        let backend = LocalSimulator::from_config(config).unwrap();
        let test = HadamardTest::new(StatePreparation::uniform(4), 1, PhaseSelector::Real, 16);
        assert!(matches!(
            backend.submit(&test).await,
            Err(HalError::PreparationTooLarge(_))
        ));
        assert_eq!(backend.job_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = LocalSimulator::new();
        assert!(matches!(
            backend.status(&JobId::new("nope")).await,
            Err(HalError::JobNotFound(_))
        ));
    }
}
