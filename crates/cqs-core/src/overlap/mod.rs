//! Overlap estimation `⟨b|Q^k|b⟩`.
//!
//! Four interchangeable strategies fill the same [`OverlapTable`]:
//!
//! | Mode | Input | Cost per shift |
//! |------|-------|----------------|
//! | exact | dense `b` | `O(n)` |
//! | sampled | dense `b`, shots | `O(shots)` |
//! | sparse | index → amplitude map | `O(support)` |
//! | circuit | [`StatePreparation`], backend | two Hadamard tests |
//!
//! The classical modes implement [`OverlapEstimator`]; circuit mode is
//! asynchronous and batches its remote jobs. [`OverlapSource`] dispatches
//! over the closed set of modes.

mod circuit;
mod exact;
mod sampled;
mod sparse;
mod table;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use num_complex::Complex64;
use tracing::{debug, instrument};

use cqs_hal::{BackendRegistry, HadamardBackend, HalError, StatePreparation};

use crate::error::{CqsError, CqsResult};
use crate::mitigation::NoiseHandling;
use crate::poll::{CancellationToken, PollPolicy};
use crate::state::{DenseState, SparseState};

pub use circuit::CircuitEstimator;
pub use exact::ExactEstimator;
pub use sampled::SampledEstimator;
pub use sparse::SparseEstimator;
pub use table::OverlapTable;

/// Synchronous overlap strategy.
pub trait OverlapEstimator {
    /// Short mode name.
    fn name(&self) -> &'static str;

    /// Dimension of `b`.
    fn dim(&self) -> usize;

    /// `⟨b|Q^shift|b⟩`.
    fn estimate(&mut self, shift: i64) -> CqsResult<Complex64>;

    /// Evaluate every shift in `±1..=max_shift`.
    fn populate(&mut self, max_shift: usize) -> CqsResult<OverlapTable> {
        OverlapTable::try_from_fn(max_shift, |k| self.estimate(k))
    }
}

/// How overlaps are obtained, parsed from an access string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessMode {
    Exact,
    Sampled,
    Sparse,
    /// Any other string names a registered backend.
    Circuit(String),
}

impl FromStr for AccessMode {
    type Err = CqsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "" => Err(CqsError::UnsupportedMode(s.to_string())),
            "exact" | "true" => Ok(AccessMode::Exact),
            "sampled" | "sample" => Ok(AccessMode::Sampled),
            "sparse" => Ok(AccessMode::Sparse),
            _ => Ok(AccessMode::Circuit(trimmed.to_string())),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Exact => write!(f, "exact"),
            AccessMode::Sampled => write!(f, "sampled"),
            AccessMode::Sparse => write!(f, "sparse"),
            AccessMode::Circuit(name) => write!(f, "{name}"),
        }
    }
}

/// Representation of `b` handed to [`OverlapSource::resolve`].
#[derive(Debug, Clone)]
pub enum StateInput {
    Dense(DenseState),
    Sparse(SparseState),
    Prepared(StatePreparation),
}

impl StateInput {
    pub fn dim(&self) -> usize {
        match self {
            StateInput::Dense(s) => s.dim(),
            StateInput::Sparse(s) => s.dim(),
            StateInput::Prepared(p) => p.dim(),
        }
    }

    /// Dense statevector, evaluating a preparation if necessary.
    pub fn to_dense(&self) -> CqsResult<DenseState> {
        match self {
            StateInput::Dense(s) => Ok(s.clone()),
            StateInput::Sparse(s) => Ok(s.to_dense()),
            StateInput::Prepared(p) => DenseState::from_preparation(p),
        }
    }

    fn to_sparse(&self) -> CqsResult<SparseState> {
        match self {
            StateInput::Sparse(s) => Ok(s.clone()),
            _ => Ok(self.to_dense()?.to_sparse()),
        }
    }

    fn to_preparation(&self) -> CqsResult<StatePreparation> {
        match self {
            StateInput::Prepared(p) => Ok(p.clone()),
            _ => Ok(StatePreparation::Amplitudes {
                amplitudes: self.to_dense()?.amplitudes().to_vec(),
            }),
        }
    }

    /// Provenance descriptor.
    pub fn descriptor(&self) -> String {
        match self {
            StateInput::Prepared(p) => p.descriptor(),
            StateInput::Dense(s) => StatePreparation::Amplitudes {
                amplitudes: s.amplitudes().to_vec(),
            }
            .descriptor(),
            StateInput::Sparse(s) => {
                let mut entries: Vec<_> = s.iter().collect();
                entries.sort_by_key(|(i, _)| *i);
                let body: Vec<String> = entries
                    .iter()
                    .map(|(i, a)| format!("{i}: {:.6}{:+.6}i", a.re, a.im))
                    .collect();
                format!("sparse[{}]{{{}}}", s.dim(), body.join(", "))
            }
        }
    }
}

/// Settings shared by the statistical modes.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub shots: u32,
    /// RNG seed for sampled mode.
    pub seed: Option<u64>,
    pub noise: NoiseHandling,
    pub poll: PollPolicy,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            shots: 1000,
            seed: None,
            noise: NoiseHandling::Raw,
            poll: PollPolicy::default(),
        }
    }
}

/// The closed set of overlap strategies.
pub enum OverlapSource {
    Exact(ExactEstimator),
    Sampled(SampledEstimator),
    Sparse(SparseEstimator),
    Circuit(CircuitEstimator),
}

impl OverlapSource {
    /// Select a strategy by access string.
    ///
    /// `exact`/`true`, `sampled`/`sample` and `sparse` are the classical modes;
    /// anything else is looked up in `registry`.
    pub fn resolve(
        access: &str,
        state: &StateInput,
        options: &SourceOptions,
        registry: &BackendRegistry,
    ) -> CqsResult<Self> {
        let mode: AccessMode = access.parse()?;
        debug!(%mode, dim = state.dim(), "resolving overlap source");
        Ok(match mode {
            AccessMode::Exact => OverlapSource::Exact(ExactEstimator::new(state.to_dense()?)),
            AccessMode::Sampled => {
                let dense = state.to_dense()?;
                OverlapSource::Sampled(match options.seed {
                    Some(seed) => SampledEstimator::seeded(dense, options.shots, seed)?,
                    None => SampledEstimator::new(dense, options.shots)?,
                })
            }
            AccessMode::Sparse => OverlapSource::Sparse(SparseEstimator::new(state.to_sparse()?)),
            AccessMode::Circuit(name) => {
                let backend = registry.resolve(&name).map_err(|e| match e {
                    HalError::UnsupportedAccess(_) => CqsError::UnsupportedMode(name.clone()),
                    other => CqsError::Hal(other),
                })?;
                Self::circuit(backend, state.to_preparation()?, options)?
            }
        })
    }

    /// Circuit mode over an explicit backend.
    pub fn circuit(
        backend: Arc<dyn HadamardBackend>,
        preparation: StatePreparation,
        options: &SourceOptions,
    ) -> CqsResult<Self> {
        Ok(OverlapSource::Circuit(
            CircuitEstimator::new(backend, preparation, options.shots)?
                .with_noise_handling(options.noise.clone())?
                .with_poll_policy(options.poll.clone())?,
        ))
    }

    /// Label recorded alongside results.
    pub fn mode(&self) -> String {
        match self {
            OverlapSource::Exact(e) => e.name().to_string(),
            OverlapSource::Sampled(e) => e.name().to_string(),
            OverlapSource::Sparse(e) => e.name().to_string(),
            OverlapSource::Circuit(e) => e.backend_name().to_string(),
        }
    }

    /// Shots per estimate for the statistical modes.
    pub fn shots(&self) -> Option<u32> {
        match self {
            OverlapSource::Sampled(e) => Some(e.shots()),
            OverlapSource::Circuit(e) => Some(e.shots()),
            OverlapSource::Exact(_) | OverlapSource::Sparse(_) => None,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            OverlapSource::Exact(e) => e.dim(),
            OverlapSource::Sampled(e) => e.dim(),
            OverlapSource::Sparse(e) => e.dim(),
            OverlapSource::Circuit(e) => e.dim(),
        }
    }

    /// Fill a table for `±1..=max_shift`.
    #[instrument(skip(self, cancel), fields(mode = %self.mode()))]
    pub async fn populate(
        &mut self,
        max_shift: usize,
        cancel: &CancellationToken,
    ) -> CqsResult<OverlapTable> {
        match self {
            OverlapSource::Exact(e) => e.populate(max_shift),
            OverlapSource::Sampled(e) => e.populate(max_shift),
            OverlapSource::Sparse(e) => e.populate(max_shift),
            OverlapSource::Circuit(e) => e.populate(max_shift, cancel).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_mode_parsing() {
        assert_eq!("exact".parse::<AccessMode>().unwrap(), AccessMode::Exact);
        assert_eq!("True".parse::<AccessMode>().unwrap(), AccessMode::Exact);
        assert_eq!("sample".parse::<AccessMode>().unwrap(), AccessMode::Sampled);
        assert_eq!("SPARSE".parse::<AccessMode>().unwrap(), AccessMode::Sparse);
        assert_eq!(
            "local-sim".parse::<AccessMode>().unwrap(),
            AccessMode::Circuit("local-sim".into())
        );
        assert!("  ".parse::<AccessMode>().is_err());
    }

    #[test]
    fn test_unknown_backend_is_unsupported() {
        let state = StateInput::Dense(DenseState::uniform(2));
        let err = OverlapSource::resolve(
            "ibmq_lima",
            &state,
            &SourceOptions::default(),
            &BackendRegistry::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, CqsError::UnsupportedMode(name) if name == "ibmq_lima"));
    }

    #[test]
    fn test_sparse_descriptor_is_sorted() {
        let one = Complex64::new(0.6, 0.0);
        let two = Complex64::new(0.8, 0.0);
        let s = SparseState::new(4, [(3, two), (0, one)]).unwrap();
        let d = StateInput::Sparse(s).descriptor();
        assert!(d.starts_with("sparse[4]{0: "));
    }
}
