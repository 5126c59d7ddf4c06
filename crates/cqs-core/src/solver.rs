//! Minimisation of `xᵀWx − 2rᵀx + 1` over real `x`.

use nalgebra::{DMatrix, DVector, LU, SymmetricEigen};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::auxiliary::AuxiliarySystem;
use crate::error::{CqsError, CqsResult};

/// Default KKT regularisation `δ`, relative to `max|W_ij|`.
pub const DEFAULT_KKT_REG: f64 = 1e-12;

/// Default pseudo-inverse cut-off.
pub const DEFAULT_EIGEN_THRESHOLD: f64 = 1e-12;

/// How the stationary system `W x = r` is solved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverStrategy {
    /// LU factorisation of `W + δ·max(1, max|W_ij|)·I` with iterative
    /// refinement against `W`. Indefinite `W` yields its stationary point.
    Qp {
        #[serde(default = "default_kkt_reg")]
        kkt_reg: f64,
        #[serde(default = "default_refine_steps")]
        refine_steps: u32,
    },
    /// Eigen-decomposition pseudo-inverse, dropping `|λ| ≤ threshold`.
    Eigen {
        #[serde(default = "default_eigen_threshold")]
        threshold: f64,
    },
}

fn default_kkt_reg() -> f64 {
    DEFAULT_KKT_REG
}

fn default_refine_steps() -> u32 {
    3
}

fn default_eigen_threshold() -> f64 {
    DEFAULT_EIGEN_THRESHOLD
}

impl Default for SolverStrategy {
    fn default() -> Self {
        SolverStrategy::Qp {
            kkt_reg: DEFAULT_KKT_REG,
            refine_steps: default_refine_steps(),
        }
    }
}

impl SolverStrategy {
    pub fn eigen() -> Self {
        SolverStrategy::Eigen {
            threshold: DEFAULT_EIGEN_THRESHOLD,
        }
    }
}

/// Loss and complex combination coefficients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinationResult {
    /// `|xᵀWx − 2rᵀx + 1|`.
    pub loss: f64,
    /// `α_t = x[t] + i·x[T + t]`.
    pub coefficients: Vec<Complex64>,
}

#[derive(Debug, Clone, Default)]
pub struct CombinationSolver {
    strategy: SolverStrategy,
}

impl CombinationSolver {
    pub fn new(strategy: SolverStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &SolverStrategy {
        &self.strategy
    }

    /// Solve the quadratic program for `system`.
    #[instrument(skip_all, fields(size = system.r().len()))]
    pub fn solve(&self, system: &AuxiliarySystem) -> CqsResult<CombinationResult> {
        let w = system.w();
        let r = system.r();
        if w.nrows() != r.len() || w.ncols() != r.len() {
            return Err(CqsError::Optimization(format!(
                "W is {}x{} but r has length {}",
                w.nrows(),
                w.ncols(),
                r.len()
            )));
        }
        if w.iter().chain(r.iter()).any(|v| !v.is_finite()) {
            return Err(CqsError::NonFinite("auxiliary system"));
        }

        let x = match &self.strategy {
            SolverStrategy::Qp {
                kkt_reg,
                refine_steps,
            } => solve_regularised(w, r, *kkt_reg, *refine_steps)?,
            SolverStrategy::Eigen { threshold } => solve_pseudo_inverse(w, r, *threshold),
        };
        if x.iter().any(|v| !v.is_finite()) {
            return Err(CqsError::NonFinite("solution"));
        }

        let loss = system.objective(&x).abs();
        if !loss.is_finite() {
            return Err(CqsError::NonFinite("loss"));
        }

        let t = system.ansatz_len();
        let coefficients = (0..t).map(|i| Complex64::new(x[i], x[t + i])).collect();
        debug!(loss, "combination solved");
        Ok(CombinationResult { loss, coefficients })
    }
}

fn solve_regularised(
    w: &DMatrix<f64>,
    r: &DVector<f64>,
    reg: f64,
    refine_steps: u32,
) -> CqsResult<DVector<f64>> {
    if !reg.is_finite() || reg < 0.0 {
        return Err(CqsError::Configuration(format!(
            "KKT regularisation must be finite and non-negative, got {reg}"
        )));
    }
    let n = r.len();
    let delta = reg * w.amax().max(1.0);
    let lu = LU::new(w + DMatrix::identity(n, n) * delta);
    let singular = || {
        CqsError::Optimization(format!("W + {delta:e}·I is singular; no stationary point"))
    };

    let mut x = lu.solve(r).ok_or_else(singular)?;
    for _ in 0..refine_steps {
        let residual = r - w * &x;
        x += lu.solve(&residual).ok_or_else(singular)?;
    }
    Ok(x)
}

fn solve_pseudo_inverse(w: &DMatrix<f64>, r: &DVector<f64>, threshold: f64) -> DVector<f64> {
    let eig = SymmetricEigen::new(w.clone());
    let mut x = DVector::zeros(r.len());
    for (i, &lambda) in eig.eigenvalues.iter().enumerate() {
        if lambda.abs() <= threshold {
            continue;
        }
        let v = eig.eigenvectors.column(i);
        x += v * (v.dot(r) / lambda);
    }
    x
}
