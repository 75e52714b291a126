//! Joint refitting of the active component subset.
//!
//! Every `n_refit` iterations the pursuit re-estimates all selected
//! coefficients at once, correcting the suboptimality that greedy
//! one-at-a-time steps accumulate. The regressor sees only the dense
//! sub-dictionary of selected columns and the original target.

use crate::data::ColMatrix;

/// Refit failures.
///
/// These abort the fit; they are never retried.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefitError {
    #[error("normal equations are singular (pivot {pivot} is not positive)")]
    SingularSystem { pivot: usize },
}

/// A regressor fitted jointly on the active sub-dictionary.
///
/// Intercept-free: predictions are exactly `sub_dict · coef`, so the refit
/// output and the stored sparse model describe the same function.
pub trait SubsetRegressor: Send + Sync {
    /// Fit on the sub-dictionary, returning one coefficient per column.
    fn fit(&self, sub_dict: &ColMatrix, y: &[f32]) -> Result<RefitFit, RefitError>;
}

/// Output of a subset refit.
#[derive(Debug, Clone)]
pub struct RefitFit {
    /// One coefficient per sub-dictionary column.
    pub coef: Vec<f32>,
}

impl RefitFit {
    /// Predictions of the refitted model on a sub-dictionary.
    pub fn decision_function(&self, sub_dict: &ColMatrix) -> Vec<f32> {
        let mut pred = vec![0.0f32; sub_dict.num_rows()];
        for (j, &w) in self.coef.iter().enumerate() {
            for (p, &v) in pred.iter_mut().zip(sub_dict.col_slice(j)) {
                *p += w * v;
            }
        }
        pred
    }
}

/// Ordinary least squares via normal equations and Cholesky factorization.
///
/// Accumulates in `f64`; the Gram matrix of a small active set is well
/// within Cholesky's comfort zone unless columns are linearly dependent,
/// which surfaces as [`RefitError::SingularSystem`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastSquares;

impl SubsetRegressor for LeastSquares {
    fn fit(&self, sub_dict: &ColMatrix, y: &[f32]) -> Result<RefitFit, RefitError> {
        let k = sub_dict.num_cols();
        debug_assert_eq!(sub_dict.num_rows(), y.len());

        // Gram matrix G = AᵀA (symmetric) and right-hand side b = Aᵀy.
        let mut gram = vec![0.0f64; k * k];
        let mut rhs = vec![0.0f64; k];
        for i in 0..k {
            let ci = sub_dict.col_slice(i);
            rhs[i] = ci
                .iter()
                .zip(y.iter())
                .map(|(&a, &b)| a as f64 * b as f64)
                .sum();
            for j in 0..=i {
                let cj = sub_dict.col_slice(j);
                let dot: f64 = ci
                    .iter()
                    .zip(cj.iter())
                    .map(|(&a, &b)| a as f64 * b as f64)
                    .sum();
                gram[i * k + j] = dot;
                gram[j * k + i] = dot;
            }
        }

        let coef = solve_symmetric(&gram, &rhs, k)?;
        Ok(RefitFit {
            coef: coef.into_iter().map(|v| v as f32).collect(),
        })
    }
}

/// Solve `A x = b` for symmetric positive definite `A` (row-major, n×n).
fn solve_symmetric(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>, RefitError> {
    let l = cholesky_decompose(a, n)?;

    // Forward substitution: L w = b.
    let mut w = vec![0.0f64; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i * n + j] * w[j];
        }
        w[i] = sum / l[i * n + i];
    }

    // Backward substitution: Lᵀ x = w.
    let mut x = vec![0.0f64; n];
    for i in (0..n).rev() {
        let mut sum = w[i];
        for j in (i + 1)..n {
            sum -= l[j * n + i] * x[j];
        }
        x[i] = sum / l[i * n + i];
    }
    Ok(x)
}

/// Cholesky factorization `A = L Lᵀ` (lower triangular, row-major).
fn cholesky_decompose(a: &[f64], n: usize) -> Result<Vec<f64>, RefitError> {
    let mut l = vec![0.0f64; n * n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }

            if i == j {
                if sum <= 0.0 {
                    return Err(RefitError::SingularSystem { pivot: i });
                }
                l[i * n + j] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }
    Ok(l)
}
