//! YAML problem files.
//!
//! A problem file names the circulant model, the right-hand side and how
//! overlaps are obtained. Everything except `model` and `state` has a
//! default; command-line flags override the file through [`Overrides`].
//!
//! ```yaml
//! model:
//!   heat_transfer: { xi: 0.2 }
//! state:
//!   kind: uniform
//!   num_qubits: 3
//! threshold: 4
//! access: local-sim
//! shots: 10000
//! noise: { strategy: clamp }
//! poll: { initial_secs: 0.5, max_idle_rounds: 20 }
//! backend: { latency_polls: 1 }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use cqs_core::{
    AccessMode, CirculantModel, DenseState, NoiseHandling, PollPolicy, SolverStrategy,
    SourceOptions, SparseState, StateInput,
};
use cqs_hal::{BackendConfig, PrepGate, StatePreparation};

/// A real number or an `[re, im]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Real(f64),
    Complex([f64; 2]),
}

impl From<Scalar> for Complex64 {
    fn from(value: Scalar) -> Self {
        match value {
            Scalar::Real(re) => Complex64::new(re, 0.0),
            Scalar::Complex([re, im]) => Complex64::new(re, im),
        }
    }
}

/// One `c·Q^p` term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermConfig {
    pub power: i64,
    pub coeff: Scalar,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelConfig {
    /// Explicit decomposition terms.
    Terms(Vec<TermConfig>),
    /// `(−2 − ξ)I + Q + Q⁻¹`.
    HeatTransfer { xi: f64 },
}

impl ModelConfig {
    pub fn build(&self) -> Result<CirculantModel> {
        match self {
            ModelConfig::Terms(terms) => Ok(CirculantModel::from_terms(
                terms.iter().map(|t| (t.power, t.coeff.into())),
            )?),
            ModelConfig::HeatTransfer { xi } => {
                if !xi.is_finite() {
                    anyhow::bail!("heat-transfer parameter xi must be finite, got {xi}");
                }
                Ok(CirculantModel::heat_transfer(*xi))
            }
        }
    }
}

/// Entry of a layered product preparation: `h` or `[ry, 0.3]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayerEntry {
    Fixed(String),
    Rotation(String, f64),
}

impl LayerEntry {
    fn to_pair(&self) -> (String, Option<f64>) {
        match self {
            LayerEntry::Fixed(name) => (name.clone(), None),
            LayerEntry::Rotation(name, angle) => (name.clone(), Some(*angle)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseEntry {
    pub index: usize,
    pub amplitude: Scalar,
}

/// Description of the right-hand side `b`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateConfig {
    Amplitudes {
        amplitudes: Vec<Scalar>,
        #[serde(default)]
        normalize: bool,
    },
    Sparse {
        dim: usize,
        entries: Vec<SparseEntry>,
        #[serde(default)]
        normalize: bool,
    },
    Circuit {
        num_qubits: u32,
        #[serde(default)]
        gates: Vec<PrepGate>,
    },
    Layers {
        layers: Vec<Vec<LayerEntry>>,
    },
    Uniform {
        num_qubits: u32,
    },
}

impl StateConfig {
    pub fn to_input(&self) -> Result<StateInput> {
        match self {
            StateConfig::Amplitudes {
                amplitudes,
                normalize,
            } => {
                let values: Vec<Complex64> = amplitudes.iter().map(|&a| a.into()).collect();
                let values = if *normalize { normalized(values)? } else { values };
                Ok(StateInput::Dense(DenseState::new(values)?))
            }
            StateConfig::Sparse {
                dim,
                entries,
                normalize,
            } => {
                let indices: Vec<usize> = entries.iter().map(|e| e.index).collect();
                let values: Vec<Complex64> = entries.iter().map(|e| e.amplitude.into()).collect();
                let values = if *normalize { normalized(values)? } else { values };
                Ok(StateInput::Sparse(SparseState::new(
                    *dim,
                    indices.into_iter().zip(values),
                )?))
            }
            StateConfig::Circuit { num_qubits, gates } => {
                let prep = StatePreparation::Circuit {
                    num_qubits: *num_qubits,
                    gates: gates.clone(),
                };
                prep.validate()?;
                Ok(StateInput::Prepared(prep))
            }
            StateConfig::Layers { layers } => {
                let pairs: Vec<Vec<(String, Option<f64>)>> = layers
                    .iter()
                    .map(|layer| layer.iter().map(LayerEntry::to_pair).collect())
                    .collect();
                Ok(StateInput::Prepared(StatePreparation::from_layers(&pairs)?))
            }
            StateConfig::Uniform { num_qubits } => {
                let prep = StatePreparation::uniform(*num_qubits);
                prep.validate()?;
                Ok(StateInput::Prepared(prep))
            }
        }
    }
}

fn normalized(values: Vec<Complex64>) -> Result<Vec<Complex64>> {
    let norm = values.iter().map(Complex64::norm_sqr).sum::<f64>().sqrt();
    if !(norm.is_finite() && norm > 0.0) {
        anyhow::bail!("cannot normalise a state with norm {norm}");
    }
    Ok(values.into_iter().map(|v| v / norm).collect())
}

/// Backoff for remote polling, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_initial_secs")]
    pub initial_secs: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_max_secs")]
    pub max_secs: f64,
    #[serde(default)]
    pub max_idle_rounds: Option<u32>,
}

fn default_initial_secs() -> f64 {
    1.0
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_secs() -> f64 {
    3600.0
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_secs: default_initial_secs(),
            multiplier: default_multiplier(),
            max_secs: default_max_secs(),
            max_idle_rounds: None,
        }
    }
}

impl PollConfig {
    pub fn to_policy(&self) -> Result<PollPolicy> {
        let initial = Duration::try_from_secs_f64(self.initial_secs)
            .with_context(|| format!("invalid poll.initial_secs: {}", self.initial_secs))?;
        let max = Duration::try_from_secs_f64(self.max_secs)
            .with_context(|| format!("invalid poll.max_secs: {}", self.max_secs))?;
        let policy = PollPolicy {
            initial,
            multiplier: self.multiplier,
            max,
            max_idle_rounds: self.max_idle_rounds,
        };
        policy.validate()?;
        Ok(policy)
    }
}

/// Where provenance records go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Defaults to `~/.cqs/records`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// File stem; defaults to `cqs_<timestamp>`.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            name: None,
            enabled: true,
        }
    }
}

/// A complete problem file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemConfig {
    pub model: ModelConfig,
    pub state: StateConfig,
    /// Largest truncation threshold; the sweep covers `1..=threshold`.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    #[serde(default = "default_access")]
    pub access: String,
    #[serde(default = "default_shots")]
    pub shots: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub solver: SolverStrategy,
    #[serde(default)]
    pub noise: NoiseHandling,
    #[serde(default)]
    pub poll: PollConfig,
    /// Extra settings passed to the circuit backend.
    #[serde(default)]
    pub backend: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub output: OutputConfig,
}

fn default_threshold() -> u32 {
    3
}

fn default_access() -> String {
    "exact".into()
}

fn default_shots() -> u32 {
    1000
}

/// Command-line values that replace file settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold: Option<u32>,
    pub access: Option<String>,
    pub shots: Option<u32>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub no_record: bool,
}

impl ProblemConfig {
    /// Load and validate a problem file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read problem file: {}", path.display()))?;
        Self::from_yaml(&source)
            .with_context(|| format!("Invalid problem file: {}", path.display()))
    }

    pub fn from_yaml(source: &str) -> Result<Self> {
        let config: ProblemConfig = serde_yaml_ng::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.access.parse::<AccessMode>()?;
        if self.shots == 0 {
            anyhow::bail!("shots must be positive");
        }
        self.noise.validate()?;
        self.poll.to_policy()?;
        Ok(())
    }

    pub fn apply(&mut self, overrides: Overrides) -> Result<()> {
        if let Some(threshold) = overrides.threshold {
            self.threshold = threshold;
        }
        if let Some(access) = overrides.access {
            self.access = access;
        }
        if let Some(shots) = overrides.shots {
            self.shots = shots;
        }
        if overrides.seed.is_some() {
            self.seed = overrides.seed;
        }
        if overrides.output_dir.is_some() {
            self.output.dir = overrides.output_dir;
        }
        if overrides.no_record {
            self.output.enabled = false;
        }
        self.validate()
    }

    pub fn access_mode(&self) -> Result<AccessMode> {
        Ok(self.access.parse()?)
    }

    pub fn source_options(&self) -> Result<SourceOptions> {
        Ok(SourceOptions {
            shots: self.shots,
            seed: self.seed,
            noise: self.noise.clone(),
            poll: self.poll.to_policy()?,
        })
    }

    /// Backend settings for circuit mode.
    pub fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::new(self.access.trim());
        config.extra = self.backend.clone();
        if let Some(seed) = self.seed {
            config
                .extra
                .entry("seed")
                .or_insert_with(|| serde_json::json!(seed));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "
model:
  heat_transfer: { xi: 0.2 }
state:
  kind: uniform
  num_qubits: 3
";

    #[test]
    fn test_defaults() {
        let config = ProblemConfig::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.threshold, 3);
        assert_eq!(config.access, "exact");
        assert_eq!(config.shots, 1000);
        assert_eq!(config.solver, SolverStrategy::default());
        assert_eq!(config.noise, NoiseHandling::Raw);
        assert!(config.output.enabled);
        assert_eq!(config.poll.to_policy().unwrap(), PollPolicy::default());
    }

    #[test]
    fn test_scalars() {
        let real: Scalar = serde_yaml_ng::from_str("2").unwrap();
        assert_eq!(Complex64::from(real), Complex64::new(2.0, 0.0));
        let complex: Scalar = serde_yaml_ng::from_str("[0.5, -1.5]").unwrap();
        assert_eq!(Complex64::from(complex), Complex64::new(0.5, -1.5));
    }

    #[test]
    fn test_overrides_win() {
        let mut config = ProblemConfig::from_yaml(MINIMAL).unwrap();
        config
            .apply(Overrides {
                threshold: Some(7),
                access: Some("sampled".into()),
                seed: Some(4),
                no_record: true,
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.threshold, 7);
        assert_eq!(config.access_mode().unwrap(), AccessMode::Sampled);
        assert_eq!(config.seed, Some(4));
        assert!(!config.output.enabled);
    }

    #[test]
    fn test_zero_shots_rejected() {
        let mut config = ProblemConfig::from_yaml(MINIMAL).unwrap();
        let err = config
            .apply(Overrides {
                shots: Some(0),
                ..Overrides::default()
            })
            .unwrap_err();
        assert!(err.to_string().contains("shots"));
    }

    #[test]
    fn test_negative_poll_interval_rejected() {
        let poll = PollConfig {
            initial_secs: -1.0,
            ..PollConfig::default()
        };
        assert!(poll.to_policy().is_err());
    }

    #[test]
    fn test_backend_config_carries_seed() {
        let yaml = format!("{MINIMAL}access: simulator\nseed: 9\nbackend: {{ latency_polls: 2 }}\n");
        let config = ProblemConfig::from_yaml(&yaml).unwrap();
        let backend = config.backend_config();
        assert_eq!(backend.name, "simulator");
        assert_eq!(backend.extra_u64("latency_polls", 0), 2);
        assert_eq!(backend.extra_u64("seed", 0), 9);
    }
}
