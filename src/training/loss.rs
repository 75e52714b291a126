//! Loss strategies for the pursuit loop.
//!
//! A loss supplies two things: the pseudo-residual (negative gradient) the
//! pursuit correlates dictionary columns against, and a closed-form 1-D
//! line search along a chosen column.
//!
//! When no loss is configured the pursuit tracks true residuals
//! incrementally instead of recomputing a gradient each iteration. For
//! squared error the two produce the same coefficient trajectory; the
//! incremental form just skips a full gradient pass per iteration.

/// A differentiable loss driving pseudo-residual pursuit.
pub trait Loss: Send + Sync {
    /// Write the negative gradient of the loss at `y_pred` into `out`.
    fn negative_gradient(&self, y: &[f32], y_pred: &[f32], out: &mut [f32]);

    /// Optimal step size along `column` starting from `y_pred`.
    fn line_search(&self, y: &[f32], y_pred: &[f32], column: &[f32]) -> f32;

    /// Loss name (for logging).
    fn name(&self) -> &'static str;
}

/// Squared error loss.
///
/// - negative gradient: `y - y_pred`
/// - line search: `<column, y - y_pred> / <column, column>`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SquaredLoss;

impl Loss for SquaredLoss {
    fn negative_gradient(&self, y: &[f32], y_pred: &[f32], out: &mut [f32]) {
        debug_assert_eq!(y.len(), y_pred.len());
        debug_assert_eq!(y.len(), out.len());
        for ((o, &yi), &pi) in out.iter_mut().zip(y.iter()).zip(y_pred.iter()) {
            *o = yi - pi;
        }
    }

    fn line_search(&self, y: &[f32], y_pred: &[f32], column: &[f32]) -> f32 {
        debug_assert_eq!(y.len(), column.len());
        let mut dot = 0.0f64;
        let mut squared_norm = 0.0f64;
        for ((&c, &yi), &pi) in column.iter().zip(y.iter()).zip(y_pred.iter()) {
            dot += c as f64 * (yi - pi) as f64;
            squared_norm += c as f64 * c as f64;
        }
        if squared_norm > 0.0 {
            (dot / squared_norm) as f32
        } else {
            0.0
        }
    }

    fn name(&self) -> &'static str {
        "squared"
    }
}

/// Loss selection for pursuit configuration.
///
/// Absence of a loss (`Option::None` at the configuration level) means the
/// pursuit tracks exact residuals incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossFunction {
    /// Squared error pseudo-residuals.
    Squared,
}

impl Loss for LossFunction {
    fn negative_gradient(&self, y: &[f32], y_pred: &[f32], out: &mut [f32]) {
        match self {
            LossFunction::Squared => SquaredLoss.negative_gradient(y, y_pred, out),
        }
    }

    fn line_search(&self, y: &[f32], y_pred: &[f32], column: &[f32]) -> f32 {
        match self {
            LossFunction::Squared => SquaredLoss.line_search(y, y_pred, column),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            LossFunction::Squared => SquaredLoss.name(),
        }
    }
}
