//! Per-column standardization of dictionaries.
//!
//! Fitted on the training dictionary, then applied to the validation
//! dictionary and to every dictionary built at prediction time, so all of
//! them live in the same feature space.

use serde::{Deserialize, Serialize};

use crate::data::ColMatrix;

/// Column-wise standardizer: subtract the mean, divide by the standard
/// deviation (population variance). Zero-variance columns are centered but
/// left unscaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scaler {
    mean: Vec<f32>,
    scale: Vec<f32>,
}

impl Scaler {
    /// Learn per-column statistics from a dictionary.
    pub fn fit(dict: &ColMatrix) -> Self {
        let n = dict.num_rows();
        let mut mean = Vec::with_capacity(dict.num_cols());
        let mut scale = Vec::with_capacity(dict.num_cols());

        for j in 0..dict.num_cols() {
            let col = dict.col_slice(j);
            let m: f64 = col.iter().map(|&v| v as f64).sum::<f64>() / n.max(1) as f64;
            let var: f64 = col
                .iter()
                .map(|&v| {
                    let d = v as f64 - m;
                    d * d
                })
                .sum::<f64>()
                / n.max(1) as f64;
            let sd = var.sqrt();

            mean.push(m as f32);
            scale.push(if sd > 0.0 { sd as f32 } else { 1.0 });
        }

        Self { mean, scale }
    }

    /// Standardize a dictionary in place.
    ///
    /// # Panics
    ///
    /// Panics if the dictionary's column count does not match the fitted
    /// statistics.
    pub fn transform(&self, dict: &mut ColMatrix) {
        assert_eq!(
            dict.num_cols(),
            self.mean.len(),
            "Column count {} does not match fitted scaler ({})",
            dict.num_cols(),
            self.mean.len()
        );

        for j in 0..dict.num_cols() {
            let mean = self.mean[j];
            let inv = 1.0 / self.scale[j];
            for v in dict.col_slice_mut(j) {
                *v = (*v - mean) * inv;
            }
        }
    }

    /// Fit on a dictionary and standardize it in one pass.
    pub fn fit_transform(dict: &mut ColMatrix) -> Self {
        let scaler = Self::fit(dict);
        scaler.transform(dict);
        scaler
    }

    /// Restrict the fitted statistics to a subset of columns, in order.
    ///
    /// Used when pruning components so the scaler keeps matching the
    /// retained dictionary width.
    pub(crate) fn select_columns(&self, indices: &[usize]) -> Scaler {
        Scaler {
            mean: indices.iter().map(|&j| self.mean[j]).collect(),
            scale: indices.iter().map(|&j| self.scale[j]).collect(),
        }
    }
}
