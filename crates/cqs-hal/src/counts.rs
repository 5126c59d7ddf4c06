//! Measurement outcomes returned by Hadamard-test backends.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Histogram of measured bitstrings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    counts: FxHashMap<String, u64>,
}

impl OutcomeCounts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` observations of `bitstring`.
    pub fn insert(&mut self, bitstring: impl Into<String>, n: u64) {
        *self.counts.entry(bitstring.into()).or_insert(0) += n;
    }

    /// Observations of `bitstring` (0 if never seen).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.counts.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of recorded shots.
    pub fn total_shots(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Iterate over `(bitstring, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.counts.iter()
    }

    /// Outcomes sorted by descending count.
    pub fn sorted(&self) -> Vec<(&String, &u64)> {
        let mut v: Vec<_> = self.counts.iter().collect();
        v.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        v
    }

    /// Marginal `(p0, p1)` of the ancilla, read from the last character of
    /// every bitstring.
    ///
    /// A bucket with zero counts has probability exactly 0, so an all-zero
    /// bucket never causes a division by zero. An empty histogram yields
    /// `None`.
    pub fn ancilla_probabilities(&self) -> Option<(f64, f64)> {
        let mut zeros = 0u64;
        let mut ones = 0u64;
        for (bits, n) in &self.counts {
            match bits.chars().last() {
                Some('0') => zeros += n,
                Some('1') => ones += n,
                _ => {}
            }
        }
        if zeros == 0 && ones == 0 {
            return None;
        }
        if zeros == 0 {
            return Some((0.0, 1.0));
        }
        if ones == 0 {
            return Some((1.0, 0.0));
        }
        let total = (zeros + ones) as f64;
        Some((zeros as f64 / total, ones as f64 / total))
    }
}

impl FromIterator<(String, u64)> for OutcomeCounts {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        let mut counts = Self::new();
        for (bits, n) in iter {
            counts.insert(bits, n);
        }
        counts
    }
}

/// Result of one completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measured outcome histogram.
    pub counts: OutcomeCounts,
    /// Number of shots executed.
    pub shots: u32,
    /// Wall-clock execution time reported by the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<u64>,
}

impl ExecutionResult {
    /// Wrap a histogram.
    pub fn new(counts: OutcomeCounts, shots: u32) -> Self {
        Self {
            counts,
            shots,
            execution_time_ms: None,
        }
    }

    /// Attach an execution time.
    #[must_use]
    pub fn with_execution_time(mut self, ms: u64) -> Self {
        self.execution_time_ms = Some(ms);
        self
    }
}
