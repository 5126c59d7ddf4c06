//! Backend capability descriptions.

use serde::{Deserialize, Serialize};

/// What a Hadamard-test backend can execute.
///
/// Capabilities are fixed at construction; `capabilities()` never performs
/// I/O.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the backend.
    pub name: String,
    /// Largest preparation register, excluding the ancilla.
    pub num_qubits: u32,
    /// Maximum number of shots per job.
    pub max_shots: u32,
    /// Whether this is a simulator (`true`) or hardware (`false`).
    pub is_simulator: bool,
    /// Free-form feature flags, e.g. `"statevector"`, `"shot_noise"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Capabilities of a local statevector simulator.
    pub fn simulator(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            max_shots: 10_000_000,
            is_simulator: true,
            features: vec!["statevector".into(), "shot_noise".into()],
        }
    }

    /// Override the shot ceiling.
    #[must_use]
    pub fn with_max_shots(mut self, max_shots: u32) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// True if `feature` is advertised.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}
