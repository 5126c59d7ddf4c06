//! Job lifecycle types.
//!
//! Every Hadamard test submitted to a backend becomes one job:
//!
//! ```text
//!   submit() ──→ Queued ──→ Running ──→ Completed
//!                  │           │
//!                  │           ├──→ Failed(reason)
//!                  │           │
//!                  └───────────┴──→ Cancelled
//! ```
//!
//! Terminal states are permanent and `result()` is only valid once a job is
//! `Completed`. Callers in `cqs-core` treat `Failed` and `Cancelled` as fatal
//! for the whole overlap-population phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::PhaseSelector;

/// Opaque handle returned by [`crate::HadamardBackend::submit`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Status of a job as reported by its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the backend queue.
    Queued,
    /// Executing.
    Running,
    /// Finished; counts are available.
    Completed,
    /// Finished with an error message.
    Failed(String),
    /// Withdrawn before completion.
    Cancelled,
}

impl JobStatus {
    /// True for `Completed`, `Failed` and `Cancelled`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed(_) | JobStatus::Cancelled
        )
    }

    /// True while the job is queued or running.
    pub fn is_pending(&self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    /// True only for `Completed`.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Completed => write!(f, "Completed"),
            JobStatus::Failed(msg) => write!(f, "Failed: {msg}"),
            JobStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Bookkeeping for one submitted Hadamard test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HadamardJob {
    /// The job identifier.
    pub id: JobId,
    /// Current status.
    pub status: JobStatus,
    /// Shift power `k` of the tested overlap.
    pub shift: i64,
    /// Which part of the overlap the ancilla encodes.
    pub phase: PhaseSelector,
    /// Number of shots requested.
    pub shots: u32,
    /// Submission time.
    pub submitted_at: DateTime<Utc>,
    /// Time the job reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl HadamardJob {
    /// Create a freshly queued job.
    pub fn new(id: impl Into<JobId>, shift: i64, phase: PhaseSelector, shots: u32) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            shift,
            phase,
            shots,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Move the job to `status`, stamping the finish time on terminal states.
    ///
    /// Terminal states never change again.
    pub fn transition(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        if self.status.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_terminal() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed("boom".into()).is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(JobStatus::Running.is_pending());
    }

    #[test]
    fn test_terminal_states_are_permanent() {
        let mut job = HadamardJob::new("job-1", 3, PhaseSelector::Real, 1024);
        job.transition(JobStatus::Running);
        assert!(job.finished_at.is_none());

        job.transition(JobStatus::Cancelled);
        assert!(job.finished_at.is_some());

        job.transition(JobStatus::Completed);
        assert_eq!(job.status, JobStatus::Cancelled);
    }
}
