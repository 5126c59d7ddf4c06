//! CQS Local Hadamard-Test Simulator
//!
//! A [`HadamardBackend`](cqs_hal::HadamardBackend) that runs every Hadamard
//! test against the exact statevector of the preparation and samples the
//! ancilla with binomial shot noise. It is the default circuit-mode target
//! for development and for exercising the overlap polling path without
//! hardware.
//!
//! # Example
//!
//! ```ignore
//! use cqs_adapter_sim::LocalSimulator;
//! use cqs_hal::{HadamardBackend, HadamardTest, PhaseSelector, StatePreparation};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = LocalSimulator::with_seed(42);
//!     let test = HadamardTest::new(StatePreparation::uniform(3), 1, PhaseSelector::Real, 4096);
//!     let job_id = backend.submit(&test).await?;
//!     let result = backend.wait(&job_id).await?;
//!     println!("Counts: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

mod hadamard;
mod simulator;

pub use simulator::LocalSimulator;
