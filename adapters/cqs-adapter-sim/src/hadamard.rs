//! Exact Hadamard-test statistics on a dense statevector.

use num_complex::Complex64;
use rand::Rng;
use rand::distributions::{Bernoulli, Distribution};

use cqs_hal::{HalError, HalResult, OutcomeCounts, PhaseSelector};

/// `⟨b|Q^shift|b⟩` with `(Q^shift b)[i] = b[(i − shift) mod n]`.
pub(crate) fn shifted_overlap(b: &[Complex64], shift: i64) -> Complex64 {
    let n = b.len() as i64;
    b.iter()
        .enumerate()
        .map(|(i, bi)| bi.conj() * b[(i as i64 - shift).rem_euclid(n) as usize])
        .sum()
}

/// Probability of measuring the ancilla in `|0⟩`.
///
/// `p0 = (1 + Re z) / 2` for the real test and `(1 − Im z) / 2` with the S
/// gate, where `z` is the shifted overlap. Clamped into `[0, 1]` so that
/// rounding on unit-modulus overlaps stays a valid probability.
pub(crate) fn ancilla_zero_probability(b: &[Complex64], shift: i64, phase: PhaseSelector) -> f64 {
    let z = shifted_overlap(b, shift);
    let p0 = match phase {
        PhaseSelector::Real => 0.5 * (1.0 + z.re),
        PhaseSelector::Imaginary => 0.5 * (1.0 - z.im),
    };
    p0.clamp(0.0, 1.0)
}

/// Draw `shots` ancilla measurements.
pub(crate) fn sample_ancilla<R: Rng>(p0: f64, shots: u32, rng: &mut R) -> HalResult<OutcomeCounts> {
    let dist = Bernoulli::new(p0)
        .map_err(|e| HalError::Backend(format!("invalid ancilla probability {p0}: {e}")))?;
    let zeros = (0..shots).filter(|_| dist.sample(rng)).count() as u64;

    let mut counts = OutcomeCounts::new();
    counts.insert("0", zeros);
    counts.insert("1", u64::from(shots) - zeros);
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn phase_ramp() -> Vec<Complex64> {
        // [1, i, -1, -i] / 2
        vec![
            Complex64::new(0.5, 0.0),
            Complex64::new(0.0, 0.5),
            Complex64::new(-0.5, 0.0),
            Complex64::new(0.0, -0.5),
        ]
    }

    #[test]
    fn test_overlap_of_phase_ramp() {
        let b = phase_ramp();
        let z = shifted_overlap(&b, 1);
        assert!((z - Complex64::new(0.0, -1.0)).norm() < 1e-12);
        assert!((shifted_overlap(&b, 0) - Complex64::new(1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn test_imaginary_test_encodes_negated_imag() {
        let b = phase_ramp();
        // Im<b|Q|b> = -1, so p0 = 1 for the S-gate test.
        let p0 = ancilla_zero_probability(&b, 1, PhaseSelector::Imaginary);
        assert!((p0 - 1.0).abs() < 1e-12);
        let p0 = ancilla_zero_probability(&b, 1, PhaseSelector::Real);
        assert!((p0 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sampling_respects_shot_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let counts = sample_ancilla(0.25, 4000, &mut rng).unwrap();
        assert_eq!(counts.total_shots(), 4000);
        let (p0, _) = counts.ancilla_probabilities().unwrap();
        assert!((p0 - 0.25).abs() < 0.05);
    }
}
