//! Reconstruction and verification of `x = Σ_t α_t Q^{a_t} b`.

use num_complex::Complex64;

use crate::ansatz::AnsatzPowers;
use crate::circulant::CirculantModel;
use crate::error::{CqsError, CqsResult};
use crate::permutation;

/// `Σ_t α_t Q^{a_t} b`.
pub fn reconstruct_solution(
    b: &[Complex64],
    ansatz: &AnsatzPowers,
    coefficients: &[Complex64],
) -> CqsResult<Vec<Complex64>> {
    if coefficients.len() != ansatz.len() {
        return Err(CqsError::Configuration(format!(
            "{} coefficients for {} ansatz powers",
            coefficients.len(),
            ansatz.len()
        )));
    }
    let mut x = vec![Complex64::new(0.0, 0.0); b.len()];
    for (a, &alpha) in ansatz.iter().zip(coefficients) {
        for (xi, bi) in x.iter_mut().zip(permutation::shift(b, a)) {
            *xi += alpha * bi;
        }
    }
    Ok(x)
}

/// `‖C·x − b‖²`.
pub fn residual_norm_sqr(model: &CirculantModel, x: &[Complex64], b: &[Complex64]) -> f64 {
    model
        .apply(x)
        .iter()
        .zip(b)
        .map(|(cx, bi)| (cx - bi).norm_sqr())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconstruct_single_shift() {
        let b: Vec<Complex64> = [1.0, 2.0, 3.0].iter().map(|&v| Complex64::new(v, 0.0)).collect();
        let ansatz = AnsatzPowers::new(vec![1]).unwrap();
        let x = reconstruct_solution(&b, &ansatz, &[Complex64::new(2.0, 0.0)]).unwrap();
        // (Q b)[k] = b[k − 1]
        assert_eq!(
            x,
            vec![
                Complex64::new(6.0, 0.0),
                Complex64::new(2.0, 0.0),
                Complex64::new(4.0, 0.0)
            ]
        );
    }

    #[test]
    fn test_identity_residual() {
        let b = vec![Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)];
        assert_eq!(residual_norm_sqr(&CirculantModel::identity(), &b, &b), 0.0);
        let ansatz = AnsatzPowers::symmetric(1);
        assert!(reconstruct_solution(&b, &ansatz, &[Complex64::new(1.0, 0.0)]).is_err());
    }
}
