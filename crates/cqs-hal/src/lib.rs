//! CQS Hardware Abstraction Layer
//!
//! Narrow contracts between the CQS core and the services it treats as
//! external: circuit execution, job lifecycle and backend resolution.
//!
//! # Overview
//!
//! - [`HadamardBackend`]: submit a [`HadamardTest`], poll its [`JobStatus`],
//!   fetch [`ExecutionResult`] counts
//! - [`StatePreparation`]: description of the unitary preparing `|b⟩`, with
//!   dense evaluation for the classical overlap modes
//! - [`BackendRegistry`]: maps access-mode strings to backends
//!
//! # Example
//!
//! ```ignore
//! use cqs_hal::{BackendRegistry, HadamardTest, PhaseSelector, StatePreparation};
//!
//! let backend = registry.resolve("local-sim")?;
//! let test = HadamardTest::new(StatePreparation::uniform(3), 1, PhaseSelector::Real, 1024);
//! let job_id = backend.submit(&test).await?;
//! let result = backend.wait(&job_id).await?;
//! let (p0, p1) = result.counts.ancilla_probabilities().unwrap();
//! println!("Re<b|Q|b> ~ {}", p0 - p1);
//! ```

pub mod backend;
pub mod capability;
pub mod counts;
pub mod error;
pub mod job;
pub mod preparation;
pub mod registry;

pub use backend::{
    BackendAvailability, BackendConfig, BackendFactory, HadamardBackend, HadamardTest,
    PhaseSelector,
};
pub use capability::Capabilities;
pub use counts::{ExecutionResult, OutcomeCounts};
pub use error::{HalError, HalResult};
pub use job::{HadamardJob, JobId, JobStatus};
pub use preparation::{PrepGate, StatePreparation};
pub use registry::BackendRegistry;
