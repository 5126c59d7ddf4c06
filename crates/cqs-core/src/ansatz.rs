//! Truncation windows of ansatz shift powers.

use serde::{Deserialize, Serialize};

use crate::error::{CqsError, CqsResult};

/// Ordered shift powers `a_t` whose states `Q^{a_t}|b⟩` span the ansatz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnsatzPowers(Vec<i64>);

impl AnsatzPowers {
    /// Arbitrary ordered powers; must be non-empty.
    pub fn new(powers: Vec<i64>) -> CqsResult<Self> {
        if powers.is_empty() {
            return Err(CqsError::Configuration("ansatz power set is empty".into()));
        }
        Ok(Self(powers))
    }

    /// The symmetric window `[−threshold, threshold]`.
    pub fn symmetric(threshold: u32) -> Self {
        let t = i64::from(threshold);
        Self((-t..=t).collect())
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }

    /// `T_total`.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    /// `max − min`.
    pub fn span(&self) -> i64 {
        let max = self.0.iter().max().copied().unwrap_or(0);
        let min = self.0.iter().min().copied().unwrap_or(0);
        max - min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_window() {
        let a = AnsatzPowers::symmetric(2);
        assert_eq!(a.as_slice(), &[-2, -1, 0, 1, 2]);
        assert_eq!(a.len(), 5);
        assert_eq!(a.span(), 4);
        assert_eq!(AnsatzPowers::symmetric(0).as_slice(), &[0]);
    }

    #[test]
    fn test_empty_rejected() {
        assert!(AnsatzPowers::new(vec![]).is_err());
    }
}
