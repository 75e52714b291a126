//! Label binarization for classification targets.
//!
//! Maps class labels to the one-column-per-class target matrix the pursuit
//! regresses against, and decodes score matrices back to labels. Binary
//! problems use a single 0/1 column; three or more classes are one-hot.

use serde::{Deserialize, Serialize};

use crate::data::ColMatrix;

/// Binarization errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LabelError {
    #[error("need at least 2 distinct classes, got {got}")]
    TooFewClasses { got: usize },
}

/// Fitted label-to-column mapping.
///
/// Classes are the distinct label values in ascending order; for binary
/// problems the single target column is 1.0 for the higher class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelBinarizer {
    classes: Vec<f32>,
}

impl LabelBinarizer {
    /// Learn the class set from training labels.
    pub fn fit(labels: &[f32]) -> Result<Self, LabelError> {
        let mut classes = labels.to_vec();
        classes.sort_by(|a, b| a.total_cmp(b));
        classes.dedup();

        if classes.len() < 2 {
            return Err(LabelError::TooFewClasses { got: classes.len() });
        }
        Ok(Self { classes })
    }

    /// The distinct classes in ascending order.
    pub fn classes(&self) -> &[f32] {
        &self.classes
    }

    /// Number of target columns produced by [`transform`](Self::transform).
    pub fn num_columns(&self) -> usize {
        if self.classes.len() == 2 {
            1
        } else {
            self.classes.len()
        }
    }

    /// Encode labels as an n×c 0/1 target matrix.
    pub fn transform(&self, labels: &[f32]) -> ColMatrix {
        let n = labels.len();
        let mut targets = ColMatrix::zeros(n, self.num_columns());

        if self.classes.len() == 2 {
            let positive = self.classes[1];
            for (slot, &label) in targets.col_slice_mut(0).iter_mut().zip(labels) {
                if label == positive {
                    *slot = 1.0;
                }
            }
        } else {
            for (c, &class) in self.classes.iter().enumerate() {
                for (slot, &label) in targets.col_slice_mut(c).iter_mut().zip(labels) {
                    if label == class {
                        *slot = 1.0;
                    }
                }
            }
        }
        targets
    }

    /// Fit and encode in one step.
    pub fn fit_transform(labels: &[f32]) -> Result<(Self, ColMatrix), LabelError> {
        let binarizer = Self::fit(labels)?;
        let targets = binarizer.transform(labels);
        Ok((binarizer, targets))
    }

    /// Decode an n×c score matrix back to labels.
    ///
    /// Binary: scores above `threshold` map to the higher class.
    /// Multiclass: row-wise argmax, first column winning ties.
    ///
    /// # Panics
    ///
    /// Panics if the score matrix width does not match the class count.
    pub fn inverse_transform(&self, scores: &ColMatrix, threshold: f32) -> Vec<f32> {
        assert_eq!(
            scores.num_cols(),
            self.num_columns(),
            "Score matrix has {} columns, expected {}",
            scores.num_cols(),
            self.num_columns()
        );

        let n = scores.num_rows();
        if self.classes.len() == 2 {
            scores
                .col_slice(0)
                .iter()
                .map(|&s| {
                    if s > threshold {
                        self.classes[1]
                    } else {
                        self.classes[0]
                    }
                })
                .collect()
        } else {
            (0..n)
                .map(|i| {
                    let mut best = 0;
                    let mut best_score = f32::NEG_INFINITY;
                    for c in 0..self.classes.len() {
                        let s = scores.col_slice(c)[i];
                        if s > best_score {
                            best = c;
                            best_score = s;
                        }
                    }
                    self.classes[best]
                })
                .collect()
        }
    }
}
