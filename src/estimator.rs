//! Estimator facade: configuration, validation, and the full fit pipeline.
//!
//! A fit resolves the basis components, checks the iteration budget
//! against them, builds the dictionary (optionally standardized), runs one
//! pursuit per target column, prunes unused components, and returns an
//! immutable fitted model. Configuration errors surface before any
//! iteration runs.

use rayon::ThreadPoolBuilder;

use crate::data::{ColMatrix, RowMatrix};
use crate::kernel::{
    column_norms, select_components, ClassDistrib, ComponentError, Kernel, Scaler,
};
use crate::labels::{LabelBinarizer, LabelError};
use crate::model::{KmpClassifierModel, KmpModel};
use crate::training::{
    fit_columns, fit_columns_validated, FitLogger, LabelAccuracy, LeastSquares, LossFunction,
    NegMeanSquaredError, PursuitParams, RefitError, Scorer, ValidationConfig, ValidationTrace,
    Verbosity,
};

// =============================================================================
// Errors
// =============================================================================

/// Configuration errors, detected at setup before any iteration runs.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("budget fraction must be in (0, 1], got {got}")]
    InvalidFraction { got: f32 },

    #[error("iteration budget resolves to zero iterations")]
    EmptyBudget,

    #[error("iteration budget ({budget}) cannot exceed the number of components ({n_components})")]
    BudgetExceedsComponents { budget: usize, n_components: usize },

    #[error("n_validate must be positive when validation data is supplied")]
    ZeroValidateInterval,

    #[error("number of targets ({targets}) does not match number of samples ({samples})")]
    TargetLenMismatch { samples: usize, targets: usize },

    #[error("validation samples have {got} features, training samples have {expected}")]
    ValidationFeatureMismatch { expected: usize, got: usize },

    #[error("components have {got} features, samples have {expected}")]
    ComponentFeatureMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Components(#[from] ComponentError),

    #[error(transparent)]
    Labels(#[from] LabelError),
}

/// Any failure of a fit.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KmpError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Refit(#[from] RefitError),
}

// =============================================================================
// Budget
// =============================================================================

/// An iteration or component budget: an absolute count, or a fraction of
/// whatever it is resolved against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Budget {
    /// Absolute count.
    Count(usize),
    /// Fraction in (0, 1], truncated to a count at resolution time.
    Fraction(f32),
}

impl Default for Budget {
    fn default() -> Self {
        Budget::Fraction(0.3)
    }
}

impl Budget {
    /// Resolve against `available`, rejecting empty or oversized budgets.
    pub fn resolve(&self, available: usize) -> Result<usize, ConfigError> {
        let resolved = match *self {
            Budget::Count(count) => count,
            Budget::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(ConfigError::InvalidFraction { got: fraction });
                }
                (fraction as f64 * available as f64) as usize
            }
        };
        if resolved == 0 {
            return Err(ConfigError::EmptyBudget);
        }
        if resolved > available {
            return Err(ConfigError::BudgetExceedsComponents {
                budget: resolved,
                n_components: available,
            });
        }
        Ok(resolved)
    }

    /// Resolve without bounds checks beyond fraction validity; used for
    /// component counts, whose bounds are enforced by the selector.
    fn resolve_unchecked(&self, available: usize) -> Result<usize, ConfigError> {
        match *self {
            Budget::Count(count) => Ok(count),
            Budget::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(ConfigError::InvalidFraction { got: fraction });
                }
                Ok((fraction as f64 * available as f64) as usize)
            }
        }
    }
}

// =============================================================================
// Parameters
// =============================================================================

/// Configuration shared by the regressor and classifier estimators.
///
/// # Example
///
/// ```
/// use pursue_rs::estimator::{Budget, KmpParams};
/// use pursue_rs::kernel::Kernel;
///
/// let params = KmpParams {
///     n_nonzero_coefs: Budget::Count(10),
///     kernel: Kernel::rbf(),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct KmpParams {
    /// How many basis functions to select per target column.
    pub n_nonzero_coefs: Budget,

    /// Loss for pseudo-residual pursuit. `None` tracks exact residuals.
    pub loss: Option<LossFunction>,

    /// Explicit basis components; overrides subsampling when set.
    pub init_components: Option<RowMatrix>,

    /// How many training samples to keep as components. `None` keeps all.
    pub n_components: Option<Budget>,

    /// Class distribution of subsampled components.
    pub class_distrib: ClassDistrib,

    /// Forbid selecting the same component twice within a column.
    pub check_duplicates: bool,

    /// Standardize dictionary columns before pursuing.
    pub scale: bool,

    /// Jointly refit the active set every `n_refit` iterations; 0 disables.
    pub n_refit: usize,

    /// Kernel used to build dictionaries.
    pub kernel: Kernel,

    /// Validation checkpoint interval.
    pub n_validate: usize,

    /// Relative-improvement threshold for validation early stopping;
    /// 0 disables.
    pub epsilon: f64,

    /// Seed for component subsampling.
    pub seed: u64,

    /// Fit progress verbosity.
    pub verbosity: Verbosity,

    /// Rayon threads: 0 uses the global pool, n > 0 a dedicated pool.
    pub n_threads: usize,
}

impl Default for KmpParams {
    fn default() -> Self {
        Self {
            n_nonzero_coefs: Budget::default(),
            loss: None,
            init_components: None,
            n_components: None,
            class_distrib: ClassDistrib::default(),
            check_duplicates: false,
            scale: false,
            n_refit: 5,
            kernel: Kernel::default(),
            n_validate: 1,
            epsilon: 0.0,
            seed: 42,
            verbosity: Verbosity::default(),
            n_threads: 0,
        }
    }
}

/// Held-out samples for validation-scored early stopping.
#[derive(Debug, Clone, Copy)]
pub struct ValidationSet<'a> {
    pub x: &'a RowMatrix,
    pub y: &'a [f32],
}

impl<'a> ValidationSet<'a> {
    pub fn new(x: &'a RowMatrix, y: &'a [f32]) -> Self {
        Self { x, y }
    }
}

/// Held-out samples with a multi-column target matrix.
#[derive(Debug, Clone, Copy)]
pub struct MatrixValidationSet<'a> {
    pub x: &'a RowMatrix,
    pub y: &'a ColMatrix,
}

impl<'a> MatrixValidationSet<'a> {
    pub fn new(x: &'a RowMatrix, y: &'a ColMatrix) -> Self {
        Self { x, y }
    }
}

// =============================================================================
// Fit outcomes
// =============================================================================

/// Outcome of a regression fit.
#[derive(Debug, Clone)]
pub struct KmpFit {
    /// The pruned sparse model.
    pub model: KmpModel,
    /// Checkpoint scores; present iff validation data was supplied.
    pub trace: Option<ValidationTrace>,
}

/// Outcome of a classification fit.
#[derive(Debug, Clone)]
pub struct KmpClassifierFit {
    /// The pruned sparse model plus label mapping.
    pub model: KmpClassifierModel,
    /// Checkpoint scores; present iff validation data was supplied.
    pub trace: Option<ValidationTrace>,
}

// =============================================================================
// Shared fit pipeline
// =============================================================================

/// Everything resolved before pursuit starts.
struct Prepared {
    components: RowMatrix,
    n_nonzero_coefs: usize,
    dict: ColMatrix,
    norms: Vec<f32>,
    scaler: Option<Scaler>,
}

fn prepare(
    params: &KmpParams,
    x: &RowMatrix,
    y: &[f32],
    logger: &FitLogger,
) -> Result<Prepared, KmpError> {
    if y.len() != x.num_rows() {
        return Err(ConfigError::TargetLenMismatch {
            samples: x.num_rows(),
            targets: y.len(),
        }
        .into());
    }

    let components = match &params.init_components {
        Some(components) => {
            if components.num_cols() != x.num_cols() {
                return Err(ConfigError::ComponentFeatureMismatch {
                    expected: x.num_cols(),
                    got: components.num_cols(),
                }
                .into());
            }
            components.clone()
        }
        None => {
            logger.stage("Selecting components...");
            let count = match &params.n_components {
                None => None,
                Some(budget) => Some(budget.resolve_unchecked(x.num_rows())?),
            };
            select_components(x, y, count, params.class_distrib, params.seed)
                .map_err(ConfigError::from)?
        }
    };

    let n_nonzero_coefs = params.n_nonzero_coefs.resolve(components.num_rows())?;

    logger.stage("Computing dictionary...");
    let mut dict = params.kernel.compute(x, &components);

    let scaler = if params.scale {
        logger.stage("Scaling dictionary...");
        Some(Scaler::fit_transform(&mut dict))
    } else {
        None
    };

    let norms = column_norms(&dict);

    Ok(Prepared {
        components,
        n_nonzero_coefs,
        dict,
        norms,
        scaler,
    })
}

/// Build the validation dictionary in the training dictionary's space.
fn validation_dictionary(
    params: &KmpParams,
    prepared: &Prepared,
    x_val: &RowMatrix,
    x_cols: usize,
    logger: &FitLogger,
) -> Result<ColMatrix, KmpError> {
    if x_val.num_cols() != x_cols {
        return Err(ConfigError::ValidationFeatureMismatch {
            expected: x_cols,
            got: x_val.num_cols(),
        }
        .into());
    }
    if params.n_validate == 0 {
        return Err(ConfigError::ZeroValidateInterval.into());
    }

    logger.stage("Computing validation dictionary...");
    let mut dict = params.kernel.compute(x_val, &prepared.components);
    if let Some(scaler) = &prepared.scaler {
        scaler.transform(&mut dict);
    }
    Ok(dict)
}

fn run_pursuits(
    params: &KmpParams,
    prepared: &Prepared,
    targets: &ColMatrix,
    validation: Option<(&ColMatrix, &dyn Scorer, &dyn Scorer)>,
    logger: &FitLogger,
) -> Result<(RowMatrix, Option<ValidationTrace>), KmpError> {
    let pursuit_params = PursuitParams {
        n_refit: params.n_refit,
        check_duplicates: params.check_duplicates,
        loss: params.loss,
    };

    logger.stage("Starting training...");
    match validation {
        None => {
            let coef = fit_columns(
                &prepared.dict,
                targets,
                &prepared.norms,
                prepared.n_nonzero_coefs,
                &pursuit_params,
                &LeastSquares,
            )?;
            Ok((coef, None))
        }
        Some((val_dict, train_scorer, val_scorer)) => {
            let config = ValidationConfig {
                dict: val_dict,
                n_validate: params.n_validate,
                epsilon: params.epsilon,
            };
            let (coef, trace) = fit_columns_validated(
                &prepared.dict,
                targets,
                &prepared.norms,
                prepared.n_nonzero_coefs,
                &pursuit_params,
                &LeastSquares,
                &config,
                train_scorer,
                val_scorer,
                logger,
            )?;
            Ok((coef, Some(trace)))
        }
    }
}

fn with_thread_pool<T>(n_threads: usize, f: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if n_threads == 0 {
        return f();
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .expect("Failed to create thread pool");
    pool.install(f)
}

// =============================================================================
// Regressor
// =============================================================================

/// Kernel matching pursuit for regression targets.
///
/// # Example
///
/// ```
/// use pursue_rs::data::RowMatrix;
/// use pursue_rs::estimator::{Budget, KmpParams, KmpRegressor};
///
/// let x = RowMatrix::from_vec(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
/// let y = vec![1.0, -1.0];
///
/// let regressor = KmpRegressor::new(KmpParams {
///     n_nonzero_coefs: Budget::Count(2),
///     n_refit: 0,
///     ..Default::default()
/// });
/// let fit = regressor.fit(&x, &y, None).unwrap();
/// let predictions = fit.model.predict(&x);
/// ```
#[derive(Debug, Clone)]
pub struct KmpRegressor {
    params: KmpParams,
}

impl KmpRegressor {
    pub fn new(params: KmpParams) -> Self {
        Self { params }
    }

    /// Fit a single-output regression model.
    pub fn fit(
        &self,
        x: &RowMatrix,
        y: &[f32],
        validation: Option<ValidationSet<'_>>,
    ) -> Result<KmpFit, KmpError> {
        let targets = ColMatrix::from_vec(y.to_vec(), y.len(), 1);
        let val_owned = validation.map(|set| {
            (
                set.x,
                ColMatrix::from_vec(set.y.to_vec(), set.y.len(), 1),
            )
        });
        let val = val_owned
            .as_ref()
            .map(|(x_val, y_val)| MatrixValidationSet::new(x_val, y_val));
        self.fit_multi(x, &targets, val)
    }

    /// Fit one pursuit per target column of an n×c matrix.
    ///
    /// # Panics
    ///
    /// Panics if `targets` has no columns.
    pub fn fit_multi(
        &self,
        x: &RowMatrix,
        targets: &ColMatrix,
        validation: Option<MatrixValidationSet<'_>>,
    ) -> Result<KmpFit, KmpError> {
        with_thread_pool(self.params.n_threads, || {
            self.fit_multi_impl(x, targets, validation)
        })
    }

    fn fit_multi_impl(
        &self,
        x: &RowMatrix,
        targets: &ColMatrix,
        validation: Option<MatrixValidationSet<'_>>,
    ) -> Result<KmpFit, KmpError> {
        let params = &self.params;
        let logger = FitLogger::new(params.verbosity);

        assert!(targets.num_cols() > 0, "targets must have at least one column");
        if targets.num_rows() != x.num_rows() {
            return Err(ConfigError::TargetLenMismatch {
                samples: x.num_rows(),
                targets: targets.num_rows(),
            }
            .into());
        }
        if let Some(set) = &validation {
            if set.y.num_rows() != set.x.num_rows() {
                return Err(ConfigError::TargetLenMismatch {
                    samples: set.x.num_rows(),
                    targets: set.y.num_rows(),
                }
                .into());
            }
        }

        let prepared = prepare(params, x, targets.col_slice(0), &logger)?;

        let (coef, trace) = match &validation {
            None => run_pursuits(params, &prepared, targets, None, &logger)?,
            Some(set) => {
                let val_dict =
                    validation_dictionary(params, &prepared, set.x, x.num_cols(), &logger)?;
                let train_scorer = NegMeanSquaredError::new(targets);
                let val_scorer = NegMeanSquaredError::new(set.y);
                run_pursuits(
                    params,
                    &prepared,
                    targets,
                    Some((&val_dict, &train_scorer, &val_scorer)),
                    &logger,
                )?
            }
        };

        let model = KmpModel::new(coef, prepared.components, params.kernel, prepared.scaler);
        Ok(KmpFit { model, trace })
    }
}

// =============================================================================
// Classifier
// =============================================================================

/// Kernel matching pursuit for classification.
///
/// Labels are binarized to one target column per class (a single column
/// for binary problems); each column is pursued independently and
/// predictions decode back through the label mapping.
#[derive(Debug, Clone)]
pub struct KmpClassifier {
    params: KmpParams,
}

impl KmpClassifier {
    pub fn new(params: KmpParams) -> Self {
        Self { params }
    }

    /// Fit a classifier on labeled samples.
    pub fn fit(
        &self,
        x: &RowMatrix,
        labels: &[f32],
        validation: Option<ValidationSet<'_>>,
    ) -> Result<KmpClassifierFit, KmpError> {
        with_thread_pool(self.params.n_threads, || {
            self.fit_impl(x, labels, validation)
        })
    }

    fn fit_impl(
        &self,
        x: &RowMatrix,
        labels: &[f32],
        validation: Option<ValidationSet<'_>>,
    ) -> Result<KmpClassifierFit, KmpError> {
        let params = &self.params;
        let logger = FitLogger::new(params.verbosity);

        if let Some(set) = &validation {
            if set.y.len() != set.x.num_rows() {
                return Err(ConfigError::TargetLenMismatch {
                    samples: set.x.num_rows(),
                    targets: set.y.len(),
                }
                .into());
            }
        }

        let prepared = prepare(params, x, labels, &logger)?;
        let (binarizer, targets) =
            LabelBinarizer::fit_transform(labels).map_err(ConfigError::from)?;

        let (coef, trace) = match &validation {
            None => run_pursuits(params, &prepared, &targets, None, &logger)?,
            Some(set) => {
                let val_dict =
                    validation_dictionary(params, &prepared, set.x, x.num_cols(), &logger)?;
                let train_scorer = LabelAccuracy::new(labels, &binarizer);
                let val_scorer = LabelAccuracy::new(set.y, &binarizer);
                run_pursuits(
                    params,
                    &prepared,
                    &targets,
                    Some((&val_dict, &train_scorer, &val_scorer)),
                    &logger,
                )?
            }
        };

        let model = KmpModel::new(coef, prepared.components, params.kernel, prepared.scaler);
        Ok(KmpClassifierFit {
            model: KmpClassifierModel::new(model, binarizer),
            trace,
        })
    }
}
