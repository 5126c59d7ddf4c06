//! Assembly of the real auxiliary system `(W, r)`.
//!
//! With `x = Σ_t α_t Q^{a_t}|b⟩` and `C = Σ_k c_k Q^{p_k}`:
//!
//! ```text
//! V[t1,t2] = Σ_{k1,k2} conj(c_k1)·c_k2·⟨b|Q^{−a_t1 − p_k1 + p_k2 + a_t2}|b⟩
//! q[t]     = Σ_k c_k·⟨b|Q^{a_t + p_k}|b⟩
//! W = [[Re V, −Im V], [Im V, Re V]],   r = [Re q; Im q]
//! ```

use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use tracing::{debug, instrument, warn};

use crate::ansatz::AnsatzPowers;
use crate::circulant::CirculantModel;
use crate::error::{CqsError, CqsResult};
use crate::overlap::OverlapTable;

/// Largest `|shift|` that [`AuxiliarySystem::build`] looks up.
pub fn required_shift(model: &CirculantModel, ansatz: &AnsatzPowers) -> usize {
    let windowed = model.span() + ansatz.span();
    let linear = ansatz
        .iter()
        .flat_map(|a| model.pows().iter().map(move |p| (a + p).abs()))
        .max()
        .unwrap_or(0);
    windowed.max(linear) as usize
}

/// Real quadratic form `xᵀWx − 2rᵀx + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuxiliarySystem {
    w: DMatrix<f64>,
    r: DVector<f64>,
}

impl AuxiliarySystem {
    /// Assemble from a populated overlap table.
    #[instrument(skip_all, fields(terms = model.term_number(), ansatz = ansatz.len()))]
    pub fn build(
        model: &CirculantModel,
        ansatz: &AnsatzPowers,
        overlaps: &OverlapTable,
    ) -> CqsResult<Self> {
        let n = ansatz.len();
        let a = ansatz.as_slice();
        let zero = Complex64::new(0.0, 0.0);

        let mut v = DMatrix::from_element(n, n, zero);
        for t1 in 0..n {
            for t2 in 0..n {
                let mut acc = zero;
                for (p1, c1) in model.terms() {
                    for (p2, c2) in model.terms() {
                        acc += c1.conj() * c2 * overlaps.get(-a[t1] - p1 + p2 + a[t2])?;
                    }
                }
                v[(t1, t2)] = acc;
            }
        }

        let mut q = DVector::from_element(n, zero);
        for t in 0..n {
            let mut acc = zero;
            for (p, c) in model.terms() {
                acc += c * overlaps.get(a[t] + p)?;
            }
            q[t] = acc;
        }

        let asymmetry = (&v - v.adjoint()).camax();
        if asymmetry > 1e-9 {
            debug!(asymmetry, "Gram matrix is not Hermitian, symmetrising");
        }
        Self::from_gram(&v, &q)
    }

    /// Embed a complex Gram matrix `V` and vector `q`.
    ///
    /// `V` is replaced by `(V + V†)/2`, so `W` is symmetric for any input.
    pub fn from_gram(v: &DMatrix<Complex64>, q: &DVector<Complex64>) -> CqsResult<Self> {
        let n = q.len();
        if v.nrows() != n || v.ncols() != n {
            return Err(CqsError::Optimization(format!(
                "Gram matrix is {}x{} but q has length {n}",
                v.nrows(),
                v.ncols()
            )));
        }
        let h = (v + v.adjoint()) * Complex64::new(0.5, 0.0);

        let mut w = DMatrix::zeros(2 * n, 2 * n);
        for i in 0..n {
            for j in 0..n {
                let z = h[(i, j)];
                w[(i, j)] = z.re;
                w[(i, j + n)] = -z.im;
                w[(i + n, j)] = z.im;
                w[(i + n, j + n)] = z.re;
            }
        }
        let r = DVector::from_iterator(
            2 * n,
            q.iter().map(|z| z.re).chain(q.iter().map(|z| z.im)),
        );

        if w.iter().chain(r.iter()).any(|x| !x.is_finite()) {
            warn!("auxiliary system contains non-finite entries");
        }
        Ok(Self { w, r })
    }

    /// Build directly from real parts, checking dimensions.
    pub fn from_parts(w: DMatrix<f64>, r: DVector<f64>) -> CqsResult<Self> {
        if !w.is_square() || w.nrows() != r.len() || r.len() % 2 != 0 {
            return Err(CqsError::Optimization(format!(
                "W is {}x{} and r has length {}; expected 2T x 2T and 2T",
                w.nrows(),
                w.ncols(),
                r.len()
            )));
        }
        Ok(Self { w, r })
    }

    pub fn w(&self) -> &DMatrix<f64> {
        &self.w
    }

    pub fn r(&self) -> &DVector<f64> {
        &self.r
    }

    /// `T_total`, the number of complex coefficients.
    pub fn ansatz_len(&self) -> usize {
        self.r.len() / 2
    }

    /// `xᵀWx − 2rᵀx + 1`.
    pub fn objective(&self, x: &DVector<f64>) -> f64 {
        x.dot(&(&self.w * x)) - 2.0 * self.r.dot(x) + 1.0
    }

    /// Row-major copy of `W`.
    pub fn w_rows(&self) -> Vec<Vec<f64>> {
        self.w
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect()
    }

    pub fn r_vec(&self) -> Vec<f64> {
        self.r.iter().copied().collect()
    }
}
