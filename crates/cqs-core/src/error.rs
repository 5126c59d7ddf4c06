//! Error types for the core crate.

use std::fmt;

use cqs_hal::HalError;
use thiserror::Error;

/// Errors produced by overlap estimation, assembly and solving.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CqsError {
    /// Circulant decomposition is malformed.
    #[error("Invalid circulant model: {0}")]
    InvalidModel(String),

    /// Access mode is neither a classical mode nor a registered backend.
    #[error("Unsupported access mode: '{0}'")]
    UnsupportedMode(String),

    /// Dense or sparse state violates its preconditions.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Any other rejected setting (shots, budgets, thresholds).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The sampler drew an index whose amplitude is exactly zero.
    #[error("Sampled index {index} has zero amplitude")]
    ZeroAmplitude {
        /// The offending basis index.
        index: usize,
    },

    /// Overlap lookup beyond the populated range.
    #[error("Shift {shift} is outside the overlap table (max |shift| = {max})")]
    ShiftOutOfRange {
        /// Requested shift.
        shift: i64,
        /// Largest populated magnitude.
        max: usize,
    },

    /// A remote Hadamard-test job failed or was cancelled.
    #[error("Remote job {job} did not complete: {reason}")]
    RemoteExecution {
        /// Job identifier.
        job: String,
        /// Terminal status reported by the backend.
        reason: String,
    },

    /// Backend transport or contract error.
    #[error("Backend error: {0}")]
    Hal(#[from] HalError),

    /// The polling wait was cancelled.
    #[error("Overlap polling cancelled")]
    PollingCancelled,

    /// The idle-round budget ran out before all jobs completed.
    #[error("Overlap polling gave up after {rounds} idle rounds")]
    PollingExhausted {
        /// Idle rounds spent.
        rounds: u32,
    },

    /// Quadratic program could not be solved.
    #[error("Optimization failed: {0}")]
    Optimization(String),

    /// Solution or loss contains NaN or infinity.
    #[error("Non-finite {0} in combination result")]
    NonFinite(&'static str),

    /// The record sink rejected an outcome.
    #[error("Record sink failed: {0}")]
    Sink(String),
}

/// Coarse error category, used by callers to decide how to report failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Estimation,
    RemoteExecution,
    Optimization,
    Sink,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::Estimation => "estimation",
            ErrorKind::RemoteExecution => "remote execution",
            ErrorKind::Optimization => "optimization",
            ErrorKind::Sink => "record sink",
        };
        f.write_str(s)
    }
}

impl CqsError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CqsError::InvalidModel(_)
            | CqsError::UnsupportedMode(_)
            | CqsError::InvalidState(_)
            | CqsError::Configuration(_) => ErrorKind::Configuration,
            CqsError::ZeroAmplitude { .. } | CqsError::ShiftOutOfRange { .. } => {
                ErrorKind::Estimation
            }
            CqsError::Hal(
                HalError::UnsupportedAccess(_)
                | HalError::InvalidPreparation(_)
                | HalError::PreparationTooLarge(_)
                | HalError::InvalidShots(_)
                | HalError::Configuration(_),
            ) => ErrorKind::Configuration,
            CqsError::RemoteExecution { .. }
            | CqsError::Hal(_)
            | CqsError::PollingCancelled
            | CqsError::PollingExhausted { .. } => ErrorKind::RemoteExecution,
            CqsError::Optimization(_) | CqsError::NonFinite(_) => ErrorKind::Optimization,
            CqsError::Sink(_) => ErrorKind::Sink,
        }
    }
}

/// Result type for core operations.
pub type CqsResult<T> = Result<T, CqsError>;
