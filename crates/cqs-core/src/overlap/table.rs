//! Cached overlaps `⟨b|Q^k|b⟩` for `|k| ≤ M`.

use num_complex::Complex64;
use serde::{Serialize, Serializer};

use crate::error::{CqsError, CqsResult};

/// Overlaps indexed by shift, each sign stored independently.
///
/// `overlap(0)` is always exactly `1 + 0i`. Estimated backends do not
/// satisfy `overlap(−k) = conj(overlap(k))`, so nothing here assumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapTable {
    positive: Vec<Complex64>,
    negative: Vec<Complex64>,
}

impl OverlapTable {
    /// Build by evaluating `f` once for every non-zero shift in `±1..=max_shift`.
    ///
    /// Each shift is requested positive first, then negative.
    pub fn try_from_fn<F>(max_shift: usize, mut f: F) -> CqsResult<Self>
    where
        F: FnMut(i64) -> CqsResult<Complex64>,
    {
        let mut positive = Vec::with_capacity(max_shift);
        let mut negative = Vec::with_capacity(max_shift);
        for k in 1..=max_shift as i64 {
            positive.push(f(k)?);
            negative.push(f(-k)?);
        }
        Ok(Self { positive, negative })
    }

    /// Build from separately estimated signs; both vectors start at shift 1.
    pub fn from_parts(positive: Vec<Complex64>, negative: Vec<Complex64>) -> CqsResult<Self> {
        if positive.len() != negative.len() {
            return Err(CqsError::Configuration(format!(
                "overlap table halves differ in length ({} vs {})",
                positive.len(),
                negative.len()
            )));
        }
        Ok(Self { positive, negative })
    }

    /// Largest populated `|k|`.
    pub fn max_shift(&self) -> usize {
        self.positive.len()
    }

    /// `⟨b|Q^shift|b⟩`.
    pub fn get(&self, shift: i64) -> CqsResult<Complex64> {
        let magnitude = shift.unsigned_abs() as usize;
        let half = if shift >= 0 {
            &self.positive
        } else {
            &self.negative
        };
        match magnitude {
            0 => Ok(Complex64::new(1.0, 0.0)),
            m => half.get(m - 1).copied().ok_or(CqsError::ShiftOutOfRange {
                shift,
                max: self.max_shift(),
            }),
        }
    }

    /// `(real, imag)` of `⟨b|Q^shift|b⟩`.
    pub fn parts(&self, shift: i64) -> CqsResult<(f64, f64)> {
        self.get(shift).map(|z| (z.re, z.im))
    }

    /// Largest `|overlap(−k) − conj(overlap(k))|` over the table.
    pub fn conjugate_asymmetry(&self) -> f64 {
        self.positive
            .iter()
            .zip(&self.negative)
            .map(|(p, n)| (n - p.conj()).norm())
            .fold(0.0, f64::max)
    }

    /// Iterate `(shift, overlap)` from `−M` to `M`.
    pub fn iter(&self) -> impl Iterator<Item = (i64, Complex64)> + '_ {
        let m = self.max_shift() as i64;
        (-m..=m).filter_map(move |k| self.get(k).ok().map(|z| (k, z)))
    }
}

impl Serialize for OverlapTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shift_is_exact_one() {
        let table = OverlapTable::try_from_fn(2, |k| Ok(Complex64::new(0.1 * k as f64, 0.3))).unwrap();
        assert_eq!(table.get(0).unwrap(), Complex64::new(1.0, 0.0));
        assert_eq!(table.parts(-2).unwrap(), (-0.2, 0.3));
        assert_eq!(table.iter().count(), 5);
    }

    #[test]
    fn test_out_of_range() {
        let table = OverlapTable::try_from_fn(1, |_| Ok(Complex64::new(0.0, 0.0))).unwrap();
        let err = table.get(-2).unwrap_err();
        assert!(matches!(err, CqsError::ShiftOutOfRange { shift: -2, max: 1 }));
        let empty = OverlapTable::from_parts(vec![], vec![]).unwrap();
        assert_eq!(empty.get(0).unwrap(), Complex64::new(1.0, 0.0));
        assert!(empty.get(1).is_err());
    }

    #[test]
    fn test_evaluation_order_and_errors() {
        let mut seen = Vec::new();
        let table = OverlapTable::try_from_fn(2, |k| {
            seen.push(k);
            Ok(Complex64::new(k as f64, 0.0))
        })
        .unwrap();
        assert_eq!(seen, vec![1, -1, 2, -2]);
        assert_eq!(table.conjugate_asymmetry(), 4.0);

        let failed = OverlapTable::try_from_fn(3, |k| {
            if k == -2 {
                Err(CqsError::ZeroAmplitude { index: 0 })
            } else {
                Ok(Complex64::new(0.0, 0.0))
            }
        });
        assert!(failed.is_err());
    }
}
