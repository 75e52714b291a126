//! Scoring functions for validation checkpoints.
//!
//! A [`Scorer`] closes over the ground truth it scores against, so the
//! orchestrator can score training and validation predictions through the
//! same narrow interface. Higher is always better.

use crate::data::ColMatrix;
use crate::labels::LabelBinarizer;

/// Scores a prediction matrix against ground truth. Higher is better.
pub trait Scorer: Send + Sync {
    /// Score an n×c prediction matrix.
    fn score(&self, predictions: &ColMatrix) -> f64;

    /// Scorer name (for logging).
    fn name(&self) -> &'static str;
}

/// Negative mean squared error over every prediction entry.
///
/// The regression default: maximizing it minimizes squared error.
#[derive(Debug, Clone, Copy)]
pub struct NegMeanSquaredError<'a> {
    targets: &'a ColMatrix,
}

impl<'a> NegMeanSquaredError<'a> {
    pub fn new(targets: &'a ColMatrix) -> Self {
        Self { targets }
    }
}

impl Scorer for NegMeanSquaredError<'_> {
    fn score(&self, predictions: &ColMatrix) -> f64 {
        assert_eq!(predictions.num_rows(), self.targets.num_rows());
        assert_eq!(predictions.num_cols(), self.targets.num_cols());

        let total: f64 = predictions
            .as_slice()
            .iter()
            .zip(self.targets.as_slice().iter())
            .map(|(&p, &t)| {
                let diff = (p - t) as f64;
                diff * diff
            })
            .sum();
        -total / predictions.as_slice().len().max(1) as f64
    }

    fn name(&self) -> &'static str {
        "neg_mean_squared_error"
    }
}

/// Fraction of decoded predictions equal to the true labels.
///
/// The classification default: prediction columns are decoded back to
/// labels with the fitted binarizer before comparing.
#[derive(Debug, Clone, Copy)]
pub struct LabelAccuracy<'a> {
    labels: &'a [f32],
    binarizer: &'a LabelBinarizer,
}

impl<'a> LabelAccuracy<'a> {
    pub fn new(labels: &'a [f32], binarizer: &'a LabelBinarizer) -> Self {
        Self { labels, binarizer }
    }
}

impl Scorer for LabelAccuracy<'_> {
    fn score(&self, predictions: &ColMatrix) -> f64 {
        assert_eq!(predictions.num_rows(), self.labels.len());

        let decoded = self.binarizer.inverse_transform(predictions, 0.5);
        let hits = decoded
            .iter()
            .zip(self.labels.iter())
            .filter(|(a, b)| a == b)
            .count();
        hits as f64 / self.labels.len().max(1) as f64
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}
