//! The greedy pursuit loop for a single target column.
//!
//! Each iteration scores every dictionary column against the current
//! residual (or negative gradient), selects the best-correlated column,
//! and updates its coefficient: either by a closed-form line search or,
//! on refit iterations, by jointly re-estimating every selected
//! coefficient.
//!
//! [`Pursuit`] is an explicit step machine: [`Pursuit::advance`] runs one
//! iteration and the current coefficient/prediction snapshots stay
//! readable between steps. Validation-aware callers step columns in
//! lockstep; everyone else drains with [`Pursuit::fit_to_completion`],
//! which walks the exact same trajectory.

use fixedbitset::FixedBitSet;

use crate::data::ColMatrix;
use crate::training::loss::{Loss, LossFunction};
use crate::training::refit::{RefitError, SubsetRegressor};

/// Per-pursuit configuration shared by every target column.
#[derive(Debug, Clone, PartialEq)]
pub struct PursuitParams {
    /// Jointly refit all selected coefficients every `n_refit` iterations.
    /// 0 disables refitting.
    pub n_refit: usize,

    /// Forbid selecting the same column twice.
    pub check_duplicates: bool,

    /// Loss driving pseudo-residual computation. `None` tracks exact
    /// residuals incrementally (equivalent to squared loss, one less pass
    /// per iteration).
    pub loss: Option<LossFunction>,
}

impl Default for PursuitParams {
    fn default() -> Self {
        Self {
            n_refit: 5,
            check_duplicates: false,
            loss: None,
        }
    }
}

/// Greedy pursuit state for one target column.
///
/// Borrows the shared read-only dictionary and column norms; owns the
/// coefficient vector, selection mask, and prediction/residual buffers.
pub struct Pursuit<'a, R: SubsetRegressor> {
    dict: &'a ColMatrix,
    y: &'a [f32],
    norms: &'a [f32],
    params: &'a PursuitParams,
    regressor: &'a R,

    coef: Vec<f32>,
    selected: FixedBitSet,
    y_pred: Vec<f32>,
    residuals: Vec<f32>,
    correlations: Vec<f32>,
    iteration: usize,
}

impl<'a, R: SubsetRegressor> Pursuit<'a, R> {
    /// Start a pursuit over `dict` for the target column `y`.
    ///
    /// # Panics
    ///
    /// Panics if the dictionary is empty or if `y`/`norms` lengths do not
    /// match its dimensions.
    pub fn new(
        dict: &'a ColMatrix,
        y: &'a [f32],
        norms: &'a [f32],
        params: &'a PursuitParams,
        regressor: &'a R,
    ) -> Self {
        assert!(dict.num_cols() > 0, "Dictionary has no columns");
        assert_eq!(y.len(), dict.num_rows(), "Target length mismatch");
        assert_eq!(norms.len(), dict.num_cols(), "Norms length mismatch");

        let n = dict.num_rows();
        let m = dict.num_cols();
        Self {
            dict,
            y,
            norms,
            params,
            regressor,
            coef: vec![0.0; m],
            selected: FixedBitSet::with_capacity(m),
            y_pred: vec![0.0; n],
            residuals: y.to_vec(),
            correlations: vec![0.0; m],
            iteration: 0,
        }
    }

    /// Current coefficient vector (length = dictionary columns).
    #[inline]
    pub fn coef(&self) -> &[f32] {
        &self.coef
    }

    /// Current prediction `dict · coef` (length = dictionary rows).
    #[inline]
    pub fn predictions(&self) -> &[f32] {
        &self.y_pred
    }

    /// Number of iterations run so far.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Run one pursuit iteration.
    ///
    /// Zero-norm columns score 0.0 and step by 0.0, so selection stays
    /// finite and deterministic even on degenerate dictionaries. On refit
    /// iterations the active set is re-estimated against the raw target
    /// regardless of the configured loss; for squared loss both
    /// conventions coincide.
    pub fn advance(&mut self) -> Result<(), RefitError> {
        self.iteration += 1;

        if let Some(loss) = &self.params.loss {
            loss.negative_gradient(self.y, &self.y_pred, &mut self.residuals);
        }

        self.score_columns();
        let best = self.select_best();
        self.selected.insert(best);

        if self.params.n_refit != 0 && self.iteration % self.params.n_refit == 0 {
            self.refit_selected()?;
        } else {
            let step = match &self.params.loss {
                None => {
                    let norm = self.norms[best];
                    if norm > 0.0 {
                        self.correlations[best] / norm
                    } else {
                        0.0
                    }
                }
                Some(loss) => loss.line_search(self.y, &self.y_pred, self.dict.col_slice(best)),
            };

            self.coef[best] += step;
            let column = self.dict.col_slice(best);
            for (p, &v) in self.y_pred.iter_mut().zip(column) {
                *p += step * v;
            }
            if self.params.loss.is_none() {
                for (r, &v) in self.residuals.iter_mut().zip(column) {
                    *r -= step * v;
                }
            }
        }

        Ok(())
    }

    /// Drain `n_iterations` steps and return the final coefficient vector.
    pub fn fit_to_completion(mut self, n_iterations: usize) -> Result<Vec<f32>, RefitError> {
        for _ in 0..n_iterations {
            self.advance()?;
        }
        Ok(self.coef)
    }

    /// Normalized correlation of every column with the current residual.
    fn score_columns(&mut self) {
        for (j, slot) in self.correlations.iter_mut().enumerate() {
            let norm = self.norms[j];
            if norm > 0.0 {
                let dot: f64 = self
                    .dict
                    .col_slice(j)
                    .iter()
                    .zip(self.residuals.iter())
                    .map(|(&c, &r)| c as f64 * r as f64)
                    .sum();
                *slot = (dot / norm as f64) as f32;
            } else {
                *slot = 0.0;
            }
        }
    }

    /// Index of the column with the largest absolute correlation.
    ///
    /// Already-selected columns score negative infinity when duplicates
    /// are disallowed; ties resolve to the first index.
    fn select_best(&self) -> usize {
        let mut best = 0;
        let mut best_score = f32::NEG_INFINITY;
        for (j, &corr) in self.correlations.iter().enumerate() {
            let score = if self.params.check_duplicates && self.selected.contains(j) {
                f32::NEG_INFINITY
            } else {
                corr.abs()
            };
            if score > best_score {
                best = j;
                best_score = score;
            }
        }
        best
    }

    /// Jointly re-estimate every selected coefficient.
    fn refit_selected(&mut self) -> Result<(), RefitError> {
        let indices: Vec<usize> = self.selected.ones().collect();
        let columns: Vec<&[f32]> = indices.iter().map(|&j| self.dict.col_slice(j)).collect();
        let sub_dict = ColMatrix::from_columns(&columns, self.dict.num_rows());

        let fit = self.regressor.fit(&sub_dict, self.y)?;
        for (&j, &w) in indices.iter().zip(fit.coef.iter()) {
            self.coef[j] = w;
        }
        self.y_pred = fit.decision_function(&sub_dict);

        if self.params.loss.is_none() {
            for ((r, &yi), &pi) in self
                .residuals
                .iter_mut()
                .zip(self.y.iter())
                .zip(self.y_pred.iter())
            {
                *r = yi - pi;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::column_norms;
    use crate::testing::assert_slice_approx_eq;
    use crate::training::refit::LeastSquares;

    fn identity_dict() -> ColMatrix {
        ColMatrix::from_vec(
            vec![
                1.0, 0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, 0.0, //
                0.0, 0.0, 1.0, 0.0, //
                0.0, 0.0, 0.0, 1.0,
            ],
            4,
            4,
        )
    }

    fn params(n_refit: usize, check_duplicates: bool, loss: Option<LossFunction>) -> PursuitParams {
        PursuitParams {
            n_refit,
            check_duplicates,
            loss,
        }
    }

    #[test]
    fn single_step_exact_recovery() {
        let dict = identity_dict();
        let norms = column_norms(&dict);
        let y = [1.0, 0.0, 0.0, 0.0];
        let p = params(0, true, None);

        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        pursuit.advance().unwrap();

        assert_slice_approx_eq(pursuit.coef(), &[1.0, 0.0, 0.0, 0.0], 1e-6);
        assert_slice_approx_eq(pursuit.predictions(), &y, 1e-6);
    }

    #[test]
    fn two_steps_recover_two_spikes() {
        let dict = identity_dict();
        let norms = column_norms(&dict);
        let y = [1.0, 1.0, 0.0, 0.0];
        let p = params(0, true, None);

        let coef = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares)
            .fit_to_completion(2)
            .unwrap();

        assert_slice_approx_eq(&coef, &[1.0, 1.0, 0.0, 0.0], 1e-6);
    }

    #[test]
    fn tie_breaks_to_first_index() {
        let dict = identity_dict();
        let norms = column_norms(&dict);
        // Columns 0 and 1 tie exactly; the first must win.
        let y = [0.5, 0.5, 0.0, 0.0];
        let p = params(0, true, None);

        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        pursuit.advance().unwrap();
        assert_eq!(pursuit.coef()[0], 0.5);
        assert_eq!(pursuit.coef()[1], 0.0);
    }

    fn overcomplete_dict() -> (ColMatrix, Vec<f32>, [f32; 5]) {
        // 5 samples, 6 columns, fixed non-orthogonal values.
        let dict = ColMatrix::from_vec(
            vec![
                0.9, 0.1, 0.4, 0.3, 0.2, //
                0.2, 0.8, 0.1, 0.4, 0.1, //
                0.1, 0.3, 0.9, 0.2, 0.5, //
                0.4, 0.2, 0.3, 0.7, 0.3, //
                0.3, 0.5, 0.2, 0.1, 0.8, //
                0.6, 0.4, 0.5, 0.2, 0.4,
            ],
            5,
            6,
        );
        let norms = column_norms(&dict);
        let y = [1.0, -0.5, 0.8, 0.2, -0.3];
        (dict, norms, y)
    }

    #[test]
    fn no_loss_matches_squared_loss_trajectory() {
        let (dict, norms, y) = overcomplete_dict();
        let p_none = params(0, true, None);
        let p_sq = params(0, true, Some(LossFunction::Squared));

        let mut a = Pursuit::new(&dict, &y, &norms, &p_none, &LeastSquares);
        let mut b = Pursuit::new(&dict, &y, &norms, &p_sq, &LeastSquares);

        for _ in 0..4 {
            a.advance().unwrap();
            b.advance().unwrap();
            assert_slice_approx_eq(a.coef(), b.coef(), 1e-5);
            assert_slice_approx_eq(a.predictions(), b.predictions(), 1e-5);
        }
    }

    #[test]
    fn drain_matches_stepping() {
        let (dict, norms, y) = overcomplete_dict();
        let p = params(2, true, None);

        let mut stepped = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        for _ in 0..4 {
            stepped.advance().unwrap();
        }
        let drained = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares)
            .fit_to_completion(4)
            .unwrap();

        assert_eq!(stepped.coef(), drained.as_slice());
    }

    #[test]
    fn squared_error_never_increases() {
        let (dict, norms, y) = overcomplete_dict();
        let p = params(0, true, None);
        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);

        let mut previous = f64::INFINITY;
        for _ in 0..5 {
            pursuit.advance().unwrap();
            let error: f64 = pursuit
                .predictions()
                .iter()
                .zip(y.iter())
                .map(|(&p, &t)| ((p - t) as f64).powi(2))
                .sum();
            assert!(error <= previous + 1e-9, "{} > {}", error, previous);
            previous = error;
        }
    }

    #[test]
    fn distinct_selection_count_matches_budget() {
        let (dict, norms, y) = overcomplete_dict();
        let p = params(0, true, None);
        let coef = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares)
            .fit_to_completion(3)
            .unwrap();

        let nonzero = coef.iter().filter(|&&c| c != 0.0).count();
        assert_eq!(nonzero, 3);
    }

    #[test]
    fn duplicates_allowed_bounds_distinct_selections() {
        let dict = identity_dict();
        let norms = column_norms(&dict);
        let y = [1.0, 0.0, 0.0, 0.0];
        let p = params(0, false, None);

        let coef = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares)
            .fit_to_completion(3)
            .unwrap();

        // After the first exact step the residual is zero; re-selections
        // contribute zero steps.
        let nonzero = coef.iter().filter(|&&c| c != 0.0).count();
        assert!(nonzero <= 3);
        assert_slice_approx_eq(&coef, &[1.0, 0.0, 0.0, 0.0], 1e-6);
    }

    #[test]
    fn exhausted_mask_still_advances_deterministically() {
        let dict = ColMatrix::from_vec(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
        let norms = column_norms(&dict);
        let y = [1.0, 2.0];
        let p = params(0, true, None);

        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        for _ in 0..2 {
            pursuit.advance().unwrap();
        }
        let settled = pursuit.coef().to_vec();

        // Every column is already selected; the forced pick adds nothing.
        pursuit.advance().unwrap();
        assert_eq!(pursuit.coef(), settled.as_slice());
        assert_eq!(pursuit.iteration(), 3);
    }

    #[test]
    fn zero_norm_column_is_never_preferred() {
        let dict = ColMatrix::from_vec(vec![0.0, 0.0, 1.0, 1.0], 2, 2);
        let norms = column_norms(&dict);
        let y = [1.0, 1.0];
        let p = params(0, true, None);

        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        pursuit.advance().unwrap();

        assert_eq!(pursuit.coef()[0], 0.0);
        assert!(pursuit.coef()[1] != 0.0);
        assert!(pursuit.coef().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn refit_corrects_greedy_steps() {
        // Correlated columns: one-at-a-time line search cannot recover the
        // exact combination in two steps, a joint refit can.
        let dict = ColMatrix::from_vec(
            vec![
                1.0, 1.0, 0.0, //
                0.0, 1.0, 1.0,
            ],
            3,
            2,
        );
        let norms = column_norms(&dict);
        // y = 2*c0 + 1*c1 exactly.
        let y = [2.0, 3.0, 1.0];

        let greedy = params(0, true, None);
        let refitting = params(2, true, None);

        let mut plain = Pursuit::new(&dict, &y, &norms, &greedy, &LeastSquares);
        let mut joint = Pursuit::new(&dict, &y, &norms, &refitting, &LeastSquares);
        for _ in 0..2 {
            plain.advance().unwrap();
            joint.advance().unwrap();
        }

        assert_slice_approx_eq(joint.coef(), &[2.0, 1.0], 1e-4);
        assert_slice_approx_eq(joint.predictions(), &y, 1e-4);

        let err = |p: &[f32]| -> f64 {
            p.iter()
                .zip(y.iter())
                .map(|(&a, &b)| ((a - b) as f64).powi(2))
                .sum()
        };
        assert!(err(joint.predictions()) <= err(plain.predictions()) + 1e-9);
    }

    #[test]
    fn refit_failure_propagates() {
        // Duplicate-selection allowed with a two-column active set made of
        // the same column twice is singular under joint refit.
        let dict = ColMatrix::from_vec(vec![1.0, 2.0, 1.0, 2.0], 2, 2);
        let norms = column_norms(&dict);
        let y = [1.0, 2.0];
        let p = params(2, true, None);

        let mut pursuit = Pursuit::new(&dict, &y, &norms, &p, &LeastSquares);
        pursuit.advance().unwrap();
        let err = pursuit.advance().unwrap_err();
        assert!(matches!(err, RefitError::SingularSystem { .. }));
    }
}
