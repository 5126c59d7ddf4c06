//! Noise handling for Hadamard-test expectations.

use serde::{Deserialize, Serialize};

use crate::error::{CqsError, CqsResult};

/// Default clamp threshold.
pub const DEFAULT_CLAMP_THRESHOLD: f64 = 0.2;

/// Post-processing applied to measured ancilla probabilities.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum NoiseHandling {
    /// `p0 − p1` as measured.
    #[default]
    Raw,
    /// Snap probabilities to `{0, ½, 1}`. A heuristic for states whose
    /// overlaps are known to be `±1` or `0`, not an error-mitigation scheme.
    Clamp {
        #[serde(default = "default_clamp_threshold")]
        threshold: f64,
    },
    /// Measure at several shot budgets and extrapolate to `1/s → 0`.
    Richardson { shot_budgets: Vec<u32> },
}

fn default_clamp_threshold() -> f64 {
    DEFAULT_CLAMP_THRESHOLD
}

impl NoiseHandling {
    /// Clamp with the default threshold.
    pub fn clamp() -> Self {
        NoiseHandling::Clamp {
            threshold: DEFAULT_CLAMP_THRESHOLD,
        }
    }

    pub fn validate(&self) -> CqsResult<()> {
        match self {
            NoiseHandling::Raw => Ok(()),
            NoiseHandling::Clamp { threshold } => {
                if !(0.0..=0.5).contains(threshold) {
                    return Err(CqsError::Configuration(format!(
                        "clamp threshold must lie in [0, 0.5], got {threshold}"
                    )));
                }
                Ok(())
            }
            NoiseHandling::Richardson { shot_budgets } => {
                if shot_budgets.is_empty() || shot_budgets.contains(&0) {
                    return Err(CqsError::Configuration(
                        "Richardson extrapolation needs non-zero shot budgets".into(),
                    ));
                }
                let mut sorted = shot_budgets.clone();
                sorted.sort_unstable();
                sorted.dedup();
                if sorted.len() != shot_budgets.len() {
                    return Err(CqsError::Configuration(format!(
                        "Richardson shot budgets must be distinct, got {shot_budgets:?}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Shot counts at which every overlap part is measured.
    pub fn shot_budgets(&self, shots: u32) -> Vec<u32> {
        match self {
            NoiseHandling::Richardson { shot_budgets } => shot_budgets.clone(),
            NoiseHandling::Raw | NoiseHandling::Clamp { .. } => vec![shots],
        }
    }

    /// `p0 − p1` after per-measurement processing.
    pub fn expectation(&self, p0: f64, p1: f64) -> f64 {
        let (p0, p1) = match self {
            NoiseHandling::Clamp { threshold } => clamp_probabilities(p0, p1, *threshold),
            NoiseHandling::Raw | NoiseHandling::Richardson { .. } => (p0, p1),
        };
        p0 - p1
    }

    /// Combine the expectations measured at each budget.
    pub fn combine(&self, expectations: &[f64]) -> CqsResult<f64> {
        match self {
            NoiseHandling::Richardson { shot_budgets } => {
                richardson_extrapolate(shot_budgets, expectations)
            }
            NoiseHandling::Raw | NoiseHandling::Clamp { .. } => {
                expectations.first().copied().ok_or_else(|| {
                    CqsError::Configuration("no expectation to combine".into())
                })
            }
        }
    }
}

/// `p0 < t → (0, 1)`, else `p1 < t → (1, 0)`, else `(½, ½)`.
pub fn clamp_probabilities(p0: f64, p1: f64, threshold: f64) -> (f64, f64) {
    if p0 < threshold {
        (0.0, 1.0)
    } else if p1 < threshold {
        (1.0, 0.0)
    } else {
        (0.5, 0.5)
    }
}

/// Extrapolate `e(s)` to infinite shots.
///
/// Lagrange interpolation in `h = 1/s` evaluated at `h = 0`:
/// `Σ_m e_m · Π_{k≠m} s_m / (s_m − s_k)`.
pub fn richardson_extrapolate(budgets: &[u32], values: &[f64]) -> CqsResult<f64> {
    if budgets.len() != values.len() || budgets.is_empty() {
        return Err(CqsError::Configuration(format!(
            "{} shot budgets for {} measurements",
            budgets.len(),
            values.len()
        )));
    }
    let mut total = 0.0;
    for (m, (&sm, &em)) in budgets.iter().zip(values).enumerate() {
        let sm = f64::from(sm);
        let mut weight = 1.0;
        for (k, &sk) in budgets.iter().enumerate() {
            if k == m {
                continue;
            }
            let sk = f64::from(sk);
            if sm == sk {
                return Err(CqsError::Configuration(
                    "Richardson shot budgets must be distinct".into(),
                ));
            }
            weight *= sm / (sm - sk);
        }
        total += em * weight;
    }
    Ok(total)
}
