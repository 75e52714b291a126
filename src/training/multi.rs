//! Fitting every target column of a multi-output problem.
//!
//! Each target column gets its own independent pursuit over the shared
//! read-only dictionary and norms. Without validation the columns are
//! embarrassingly parallel and run on rayon. With validation the columns
//! are stepped in lockstep so checkpoints see every column at the same
//! iteration; that path is inherently sequential.

use rayon::prelude::*;

use crate::data::{ColMatrix, RowMatrix};
use crate::model::decision_scores;
use crate::training::callback::ScoreTracker;
use crate::training::logger::FitLogger;
use crate::training::metric::Scorer;
use crate::training::pursuit::{Pursuit, PursuitParams};
use crate::training::refit::{RefitError, SubsetRegressor};

/// Per-checkpoint scores recorded during a validated fit.
///
/// The three vectors run in parallel: entry i holds the iteration index
/// and the training/validation scores of the i-th checkpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationTrace {
    pub iterations: Vec<usize>,
    pub training_scores: Vec<f64>,
    pub validation_scores: Vec<f64>,
}

impl ValidationTrace {
    /// Number of recorded checkpoints.
    pub fn len(&self) -> usize {
        self.iterations.len()
    }

    /// True if no checkpoint ever ran.
    pub fn is_empty(&self) -> bool {
        self.iterations.is_empty()
    }

    fn push(&mut self, iteration: usize, training: f64, validation: f64) {
        self.iterations.push(iteration);
        self.training_scores.push(training);
        self.validation_scores.push(validation);
    }
}

/// Validation inputs for [`fit_columns_validated`].
pub struct ValidationConfig<'a> {
    /// Validation dictionary (validation samples × components), built with
    /// the same kernel and scaling as the training dictionary.
    pub dict: &'a ColMatrix,
    /// Checkpoint every `n_validate` iterations.
    pub n_validate: usize,
    /// Relative-improvement threshold for early stopping; `<= 0` disables.
    pub epsilon: f64,
}

/// Fit every target column to completion, in parallel.
///
/// Returns the stacked coefficient matrix (target columns × dictionary
/// columns). Any column's refit failure aborts the whole fit.
pub fn fit_columns<R: SubsetRegressor>(
    dict: &ColMatrix,
    targets: &ColMatrix,
    norms: &[f32],
    n_iterations: usize,
    params: &PursuitParams,
    regressor: &R,
) -> Result<RowMatrix, RefitError> {
    assert_eq!(targets.num_rows(), dict.num_rows(), "Target rows mismatch");

    let coefs: Vec<Vec<f32>> = (0..targets.num_cols())
        .into_par_iter()
        .map(|c| {
            Pursuit::new(dict, targets.col_slice(c), norms, params, regressor)
                .fit_to_completion(n_iterations)
        })
        .collect::<Result<_, _>>()?;

    let rows: Vec<&[f32]> = coefs.iter().map(|v| v.as_slice()).collect();
    Ok(RowMatrix::from_rows(&rows, dict.num_cols()))
}

/// Fit every target column with validation-scored checkpoints.
///
/// All columns advance in lockstep. Every `n_validate`-th iteration the
/// stacked coefficients are scored on the validation dictionary; the
/// best-scoring snapshot is retained and returned, which may predate the
/// final iteration. Stops early when the validation series plateaus
/// (see [`ScoreTracker::converged`]).
///
/// If the budget is smaller than `n_validate`, no checkpoint ever runs
/// and the final coefficients are returned with an empty trace.
#[allow(clippy::too_many_arguments)]
pub fn fit_columns_validated<R: SubsetRegressor>(
    dict: &ColMatrix,
    targets: &ColMatrix,
    norms: &[f32],
    n_iterations: usize,
    params: &PursuitParams,
    regressor: &R,
    validation: &ValidationConfig<'_>,
    train_scorer: &dyn Scorer,
    validation_scorer: &dyn Scorer,
    logger: &FitLogger,
) -> Result<(RowMatrix, ValidationTrace), RefitError> {
    assert_eq!(targets.num_rows(), dict.num_rows(), "Target rows mismatch");
    assert_eq!(
        validation.dict.num_cols(),
        dict.num_cols(),
        "Validation dictionary has a different component count"
    );
    assert!(validation.n_validate > 0, "n_validate must be positive");

    let mut pursuits: Vec<Pursuit<'_, R>> = (0..targets.num_cols())
        .map(|c| Pursuit::new(dict, targets.col_slice(c), norms, params, regressor))
        .collect();

    let mut tracker = ScoreTracker::new(validation.epsilon);
    let mut trace = ValidationTrace::default();
    let mut best_coef: Option<RowMatrix> = None;

    for iteration in 1..=n_iterations {
        for pursuit in pursuits.iter_mut() {
            pursuit.advance()?;
        }

        if iteration % validation.n_validate != 0 {
            continue;
        }

        let coef = stack_coefficients(&pursuits, dict.num_cols());
        let train_pred = stack_predictions(&pursuits, dict.num_rows());
        let val_pred = decision_scores(validation.dict, &coef);

        let validation_score = validation_scorer.score(&val_pred);
        let training_score = train_scorer.score(&train_pred);
        logger.checkpoint(iteration, n_iterations, training_score, validation_score);

        if tracker.improved(validation_score) {
            best_coef = Some(coef);
        }
        trace.push(iteration, training_score, validation_score);

        if tracker.converged(&trace.validation_scores) {
            logger.converged(iteration);
            break;
        }
    }

    let coef = match best_coef {
        Some(best) => best,
        None => stack_coefficients(&pursuits, dict.num_cols()),
    };
    Ok((coef, trace))
}

fn stack_coefficients<R: SubsetRegressor>(
    pursuits: &[Pursuit<'_, R>],
    num_cols: usize,
) -> RowMatrix {
    let rows: Vec<&[f32]> = pursuits.iter().map(|p| p.coef()).collect();
    RowMatrix::from_rows(&rows, num_cols)
}

fn stack_predictions<R: SubsetRegressor>(
    pursuits: &[Pursuit<'_, R>],
    num_rows: usize,
) -> ColMatrix {
    let cols: Vec<&[f32]> = pursuits.iter().map(|p| p.predictions()).collect();
    ColMatrix::from_columns(&cols, num_rows)
}
