//! Fitted kernel matching pursuit models.
//!
//! A fitted model is an immutable record: the retained basis components,
//! one coefficient row per target column, the kernel, and the optional
//! dictionary scaler. Prediction rebuilds the dictionary against the
//! retained components and applies the sparse linear combination.

use serde::{Deserialize, Serialize};

use crate::data::{ColMatrix, RowMatrix};
use crate::kernel::{Kernel, Scaler};
use crate::labels::LabelBinarizer;

/// Sparse linear combination of dictionary columns: `dict · coefᵀ`.
///
/// Skips zero coefficients, which dominate after pursuit.
pub(crate) fn decision_scores(dict: &ColMatrix, coef: &RowMatrix) -> ColMatrix {
    assert_eq!(dict.num_cols(), coef.num_cols(), "Component count mismatch");

    let n = dict.num_rows();
    let mut scores = ColMatrix::zeros(n, coef.num_rows());
    for out in 0..coef.num_rows() {
        let weights = coef.row_slice(out);
        let column = scores.col_slice_mut(out);
        for (j, &w) in weights.iter().enumerate() {
            if w == 0.0 {
                continue;
            }
            for (s, &v) in column.iter_mut().zip(dict.col_slice(j)) {
                *s += w * v;
            }
        }
    }
    scores
}

/// Components that received a nonzero coefficient in at least one row.
fn used_columns(coef: &RowMatrix) -> Vec<usize> {
    (0..coef.num_cols())
        .filter(|&j| (0..coef.num_rows()).any(|c| coef.get(c, j) != Some(0.0)))
        .collect()
}

/// Drop every component whose coefficient is zero across all target rows.
///
/// Returns the pruned (coefficients, components) pair; the coefficient
/// width and the component count stay in lockstep. Idempotent.
pub(crate) fn prune_unused(coef: &RowMatrix, components: &RowMatrix) -> (RowMatrix, RowMatrix) {
    assert_eq!(coef.num_cols(), components.num_rows(), "Component count mismatch");

    let used = used_columns(coef);

    let mut kept_coef = Vec::with_capacity(coef.num_rows() * used.len());
    for c in 0..coef.num_rows() {
        let row = coef.row_slice(c);
        kept_coef.extend(used.iter().map(|&j| row[j]));
    }
    let kept_coef = RowMatrix::from_vec(kept_coef, coef.num_rows(), used.len());

    let kept_rows: Vec<&[f32]> = used.iter().map(|&j| components.row_slice(j)).collect();
    let kept_components = RowMatrix::from_rows(&kept_rows, components.num_cols());

    (kept_coef, kept_components)
}

/// A fitted sparse kernel model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmpModel {
    components: RowMatrix,
    coef: RowMatrix,
    kernel: Kernel,
    scaler: Option<Scaler>,
}

impl KmpModel {
    /// Assemble a model from fit outputs, pruning unused components.
    ///
    /// The scaler's per-column statistics are pruned with the components
    /// so prediction-time dictionaries keep matching its width.
    pub(crate) fn new(
        coef: RowMatrix,
        components: RowMatrix,
        kernel: Kernel,
        scaler: Option<Scaler>,
    ) -> Self {
        let used = used_columns(&coef);
        let scaler = scaler.map(|s| s.select_columns(&used));
        let (coef, components) = prune_unused(&coef, &components);
        Self {
            components,
            coef,
            kernel,
            scaler,
        }
    }

    /// Retained basis components, one per row.
    pub fn components(&self) -> &RowMatrix {
        &self.components
    }

    /// Coefficient matrix: one row per target column, one column per
    /// retained component.
    pub fn coefficients(&self) -> &RowMatrix {
        &self.coef
    }

    /// Number of retained components.
    pub fn num_components(&self) -> usize {
        self.components.num_rows()
    }

    /// Number of target columns.
    pub fn num_outputs(&self) -> usize {
        self.coef.num_rows()
    }

    /// Raw scores for new samples: an n×c matrix, one column per target
    /// column.
    ///
    /// # Panics
    ///
    /// Panics if `x` does not have the feature dimension the model was
    /// fitted with.
    pub fn decision_function(&self, x: &RowMatrix) -> ColMatrix {
        let mut dict = self.kernel.compute(x, &self.components);
        if let Some(scaler) = &self.scaler {
            scaler.transform(&mut dict);
        }
        decision_scores(&dict, &self.coef)
    }

    /// Single-output prediction convenience: the first score column.
    pub fn predict(&self, x: &RowMatrix) -> Vec<f32> {
        self.decision_function(x).col_slice(0).to_vec()
    }
}

/// A fitted classifier: a [`KmpModel`] plus the label mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KmpClassifierModel {
    model: KmpModel,
    binarizer: LabelBinarizer,
}

impl KmpClassifierModel {
    pub(crate) fn new(model: KmpModel, binarizer: LabelBinarizer) -> Self {
        Self { model, binarizer }
    }

    /// The underlying sparse kernel model.
    pub fn model(&self) -> &KmpModel {
        &self.model
    }

    /// The distinct classes in ascending order.
    pub fn classes(&self) -> &[f32] {
        self.binarizer.classes()
    }

    /// Raw per-class scores.
    pub fn decision_function(&self, x: &RowMatrix) -> ColMatrix {
        self.model.decision_function(x)
    }

    /// Predicted class labels.
    pub fn predict(&self, x: &RowMatrix) -> Vec<f32> {
        let scores = self.model.decision_function(x);
        self.binarizer.inverse_transform(&scores, 0.5)
    }
}
