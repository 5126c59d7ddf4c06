//! Hadamard-test backend trait and configuration.
//!
//! The core never builds circuits itself. It hands a [`HadamardTest`] to a
//! [`HadamardBackend`], which is responsible for compiling the test circuit
//!
//! ```text
//!   anc: ─H─[S]─────●──────H─ M
//!                   │
//!   reg: ─U_b─QFT─ Φ(k) ─────
//! ```
//!
//! and running it. The ancilla marginal satisfies
//! `p(0) − p(1) = Re⟨b|Q^k|b⟩` for [`PhaseSelector::Real`] and
//! `p(0) − p(1) = −Im⟨b|Q^k|b⟩` for [`PhaseSelector::Imaginary`] (the S gate).
//!
//! ## Method table
//!
//! | Method | Kind | Returns |
//! |--------|------|---------|
//! | `name()` | sync | `&str` |
//! | `capabilities()` | sync | `&Capabilities` |
//! | `availability()` | async | `HalResult<BackendAvailability>` |
//! | `submit()` | async | `HalResult<JobId>` |
//! | `status()` | async | `HalResult<JobStatus>` |
//! | `result()` | async | `HalResult<ExecutionResult>` |
//! | `cancel()` | async | `HalResult<()>` |
//! | `wait()` | async, provided | `HalResult<ExecutionResult>` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::capability::Capabilities;
use crate::counts::ExecutionResult;
use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::preparation::StatePreparation;

/// Which part of the overlap the Hadamard test measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseSelector {
    /// Plain Hadamard test: real part.
    Real,
    /// S gate on the ancilla: negated imaginary part.
    Imaginary,
}

impl fmt::Display for PhaseSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseSelector::Real => write!(f, "real"),
            PhaseSelector::Imaginary => write!(f, "imag"),
        }
    }
}

/// One unit of remote work: estimate one part of `⟨b|Q^shift|b⟩`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HadamardTest {
    /// Preparation of `|b⟩`.
    pub preparation: StatePreparation,
    /// Shift power `k`.
    pub shift: i64,
    /// Real or imaginary part.
    pub phase: PhaseSelector,
    /// Number of shots.
    pub shots: u32,
}

impl HadamardTest {
    /// Create a test request.
    pub fn new(preparation: StatePreparation, shift: i64, phase: PhaseSelector, shots: u32) -> Self {
        Self {
            preparation,
            shift,
            phase,
            shots,
        }
    }

    /// Check the request against backend capabilities.
    pub fn validate(&self, caps: &Capabilities) -> HalResult<()> {
        if self.shots == 0 {
            return Err(HalError::InvalidShots("shot count must be positive".into()));
        }
        if self.shots > caps.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{} shots requested, backend '{}' allows at most {}",
                self.shots, caps.name, caps.max_shots
            )));
        }
        let width = self.preparation.num_qubits().ok_or_else(|| {
            HalError::InvalidPreparation(format!(
                "dimension {} is not a power of two",
                self.preparation.dim()
            ))
        })?;
        if width > caps.num_qubits {
            return Err(HalError::PreparationTooLarge(format!(
                "preparation needs {width} qubits, backend '{}' supports {}",
                caps.name, caps.num_qubits
            )));
        }
        Ok(())
    }
}

/// Configuration for a backend instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Name the backend is registered under.
    pub name: String,
    /// Additional configuration.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BackendConfig {
    /// Create a configuration with no extras.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Add extra configuration.
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an unsigned extra, falling back to `default`.
    pub fn extra_u64(&self, key: &str, default: u64) -> u64 {
        self.extra
            .get(key)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(default)
    }
}

/// Backend availability information.
#[derive(Debug, Clone)]
pub struct BackendAvailability {
    /// Whether the backend is accepting jobs.
    pub is_available: bool,
    /// Jobs currently queued, if known.
    pub queue_depth: Option<u32>,
    /// Human-readable status message.
    pub status_message: Option<String>,
}

impl BackendAvailability {
    /// Zero queue, always accepting.
    pub fn always_available() -> Self {
        Self {
            is_available: true,
            queue_depth: Some(0),
            status_message: None,
        }
    }

    /// Offline with a reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            is_available: false,
            queue_depth: None,
            status_message: Some(reason.into()),
        }
    }
}

/// Execution collaborator for circuit-based overlap estimation.
///
/// # Contract
///
/// - `capabilities()` is synchronous, infallible and cached.
/// - `submit()` returns immediately with a job in `Queued` (or a later)
///   state; it never blocks on execution.
/// - `status()` is non-blocking.
/// - `result()` is only valid once `status()` reports `Completed`.
#[async_trait]
pub trait HadamardBackend: Send + Sync {
    /// Name of this backend.
    fn name(&self) -> &str;

    /// Capabilities of this backend.
    fn capabilities(&self) -> &Capabilities;

    /// Liveness and queue information.
    async fn availability(&self) -> HalResult<BackendAvailability>;

    /// Submit a Hadamard test.
    async fn submit(&self, test: &HadamardTest) -> HalResult<JobId>;

    /// Current status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Outcome counts of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Wait for a single job.
    ///
    /// Polls every 500ms for up to 5 minutes. Overlap population does not
    /// use this; it drives its own queue with backoff and cancellation.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let poll_interval = Duration::from_millis(500);
        let max_polls = 600;

        for _ in 0..max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(poll_interval).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }
}

/// Trait for creating backends from configuration.
pub trait BackendFactory: HadamardBackend + Sized {
    /// Create a backend from configuration.
    fn from_config(config: BackendConfig) -> HalResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_config_extras() {
        let config = BackendConfig::new("local").with_extra("latency_polls", serde_json::json!(3));
        assert_eq!(config.name, "local");
        assert_eq!(config.extra_u64("latency_polls", 0), 3);
        assert_eq!(config.extra_u64("missing", 7), 7);
    }

    #[test]
    fn test_validate_rejects_zero_shots() {
        let caps = Capabilities::simulator("local", 4);
        let test = HadamardTest::new(StatePreparation::uniform(2), 1, PhaseSelector::Real, 0);
        assert!(matches!(test.validate(&caps), Err(HalError::InvalidShots(_))));
    }

    #[test]
    fn test_validate_rejects_wide_preparation() {
        let caps = Capabilities::simulator("local", 2);
        let test = HadamardTest::new(StatePreparation::uniform(3), 1, PhaseSelector::Real, 10);
        assert!(matches!(
            test.validate(&caps),
            Err(HalError::PreparationTooLarge(_))
        ));
    }

    #[test]
    fn test_validate_rejects_non_register_amplitudes() {
        let caps = Capabilities::simulator("local", 8);
        let prep = StatePreparation::Amplitudes {
            amplitudes: vec![num_complex::Complex64::new(1.0, 0.0); 3],
        };
        let test = HadamardTest::new(prep, 1, PhaseSelector::Imaginary, 10);
        assert!(matches!(
            test.validate(&caps),
            Err(HalError::InvalidPreparation(_))
        ));
    }

    #[test]
    fn test_availability_helpers() {
        assert!(BackendAvailability::always_available().is_available);
        let down = BackendAvailability::unavailable("maintenance");
        assert!(!down.is_available);
        assert_eq!(down.status_message.as_deref(), Some("maintenance"));
    }
}
