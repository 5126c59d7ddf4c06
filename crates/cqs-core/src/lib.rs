//! `cqs-core`: circulant linear systems by classical combination of quantum
//! states.
//!
//! Approximates the solution of `C·x = b`, with `C = Σ_m c_m Q^{p_m}` a
//! weighted sum of cyclic shifts, as a truncated combination
//! `x ≈ Σ_t α_t Q^{a_t} b`. The coefficients come from a small real
//! quadratic program whose entries are overlaps `⟨b|Q^k|b⟩`:
//!
//! 1. [`overlap`] estimates every required overlap (exact, sampled, sparse or
//!    via Hadamard tests on a [`cqs_hal::HadamardBackend`])
//! 2. [`auxiliary`] assembles the real system `(W, r)`
//! 3. [`solver`] minimises `xᵀWx − 2rᵀx + 1`
//! 4. [`pipeline`] runs the three for each truncation threshold
//!
//! # Quick start
//!
//! ```rust
//! use cqs_core::{CirculantModel, DenseState, Orchestrator, OverlapSource};
//! use cqs_core::overlap::ExactEstimator;
//!
//! # tokio_test_block_on(async {
//! let model = CirculantModel::heat_transfer(0.2);
//! let source = OverlapSource::Exact(ExactEstimator::new(DenseState::uniform(3)));
//! let mut orchestrator = Orchestrator::new(model, source);
//! let outcome = orchestrator.solve_threshold(1).await.unwrap();
//! assert_eq!(outcome.result.coefficients.len(), 3);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod ansatz;
pub mod auxiliary;
pub mod circulant;
pub mod error;
pub mod mitigation;
pub mod overlap;
pub mod permutation;
pub mod pipeline;
pub mod poll;
pub mod solution;
pub mod solver;
pub mod state;

pub use ansatz::AnsatzPowers;
pub use auxiliary::{AuxiliarySystem, required_shift};
pub use circulant::CirculantModel;
pub use error::{CqsError, CqsResult, ErrorKind};
pub use mitigation::NoiseHandling;
pub use overlap::{
    AccessMode, OverlapEstimator, OverlapSource, OverlapTable, SourceOptions, StateInput,
};
pub use permutation::permutation_matrix;
pub use pipeline::{Orchestrator, RecordSink, ThresholdOutcome};
pub use poll::{CancellationToken, PollPolicy};
pub use solution::{reconstruct_solution, residual_norm_sqr};
pub use solver::{CombinationResult, CombinationSolver, SolverStrategy};
pub use state::{DenseState, SparseState};
