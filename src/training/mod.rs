//! Training infrastructure for kernel matching pursuit.
//!
//! Core types:
//!
//! - [`Pursuit`]: the greedy selection/update loop for one target column
//! - [`PursuitParams`]: per-pursuit configuration
//! - [`Loss`] / [`SquaredLoss`] / [`LossFunction`]: pseudo-residual
//!   strategies with closed-form line search
//! - [`SubsetRegressor`] / [`LeastSquares`]: joint refitting of the
//!   active component subset
//! - [`fit_columns`] / [`fit_columns_validated`]: multi-column
//!   orchestration, parallel or validation-checkpointed
//! - [`Scorer`]: validation scoring contracts
//! - [`ScoreTracker`]: best-snapshot and plateau bookkeeping
//! - [`FitLogger`] / [`Verbosity`]: fit progress output

mod callback;
mod logger;
mod loss;
mod metric;
mod multi;
mod pursuit;
mod refit;

pub use callback::ScoreTracker;
pub use logger::{FitLogger, Verbosity};
pub use loss::{Loss, LossFunction, SquaredLoss};
pub use metric::{LabelAccuracy, NegMeanSquaredError, Scorer};
pub use multi::{fit_columns, fit_columns_validated, ValidationConfig, ValidationTrace};
pub use pursuit::{Pursuit, PursuitParams};
pub use refit::{LeastSquares, RefitError, RefitFit, SubsetRegressor};
