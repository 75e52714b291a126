//! Dictionary construction: kernel functions between sample sets.
//!
//! A dictionary is the dense matrix of kernel similarities between the
//! training samples and the basis components, one column per component.
//! The pursuit learns a sparse linear combination over these columns.
//!
//! # Available kernels
//!
//! - [`Kernel::Linear`]: `k(x, c) = <x, c>`
//! - [`Kernel::Polynomial`]: `k(x, c) = (gamma * <x, c> + coef0)^degree`
//! - [`Kernel::Rbf`]: `k(x, c) = exp(-gamma * ||x - c||²)`

mod components;
mod scaling;

pub use components::{select_components, ClassDistrib, ComponentError};
pub use scaling::Scaler;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::{ColMatrix, RowMatrix};

/// Kernel function used to build dictionaries.
///
/// # Example
///
/// ```
/// use pursue_rs::data::RowMatrix;
/// use pursue_rs::kernel::Kernel;
///
/// let x = RowMatrix::from_vec(vec![1.0, 0.0, 0.0, 1.0], 2, 2);
/// let dict = Kernel::Linear.compute(&x, &x);
/// assert_eq!(dict.col_slice(0), &[1.0, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    /// Plain dot product.
    Linear,
    /// Polynomial kernel `(gamma * <x, c> + coef0)^degree`.
    Polynomial { gamma: f32, coef0: f32, degree: u32 },
    /// Gaussian kernel `exp(-gamma * ||x - c||²)`.
    Rbf { gamma: f32 },
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Linear
    }
}

impl Kernel {
    /// Polynomial kernel with the default parameters.
    pub fn polynomial() -> Self {
        Kernel::Polynomial {
            gamma: 0.1,
            coef0: 1.0,
            degree: 4,
        }
    }

    /// RBF kernel with the default bandwidth.
    pub fn rbf() -> Self {
        Kernel::Rbf { gamma: 0.1 }
    }

    /// Kernel name (for logging).
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Linear => "linear",
            Kernel::Polynomial { .. } => "polynomial",
            Kernel::Rbf { .. } => "rbf",
        }
    }

    /// Evaluate the kernel between two points.
    #[inline]
    fn eval(&self, a: &[f32], b: &[f32]) -> f32 {
        match *self {
            Kernel::Linear => dot(a, b) as f32,
            Kernel::Polynomial {
                gamma,
                coef0,
                degree,
            } => {
                let d = dot(a, b) as f32;
                (gamma * d + coef0).powi(degree as i32)
            }
            Kernel::Rbf { gamma } => {
                let sq: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(&ai, &bi)| {
                        let diff = (ai - bi) as f64;
                        diff * diff
                    })
                    .sum();
                (-(gamma as f64) * sq).exp() as f32
            }
        }
    }

    /// Compute the dense dictionary between `x` (n samples) and
    /// `components` (k basis points): an n×k column-major matrix where
    /// column j holds the kernel of every sample against component j.
    ///
    /// Columns are filled in parallel on the current rayon pool.
    ///
    /// # Panics
    ///
    /// Panics if `x` and `components` have different feature dimensions.
    pub fn compute(&self, x: &RowMatrix, components: &RowMatrix) -> ColMatrix {
        assert_eq!(
            x.num_cols(),
            components.num_cols(),
            "Feature dimension mismatch: samples have {}, components have {}",
            x.num_cols(),
            components.num_cols()
        );

        let n = x.num_rows();
        let k = components.num_rows();
        let mut dict = ColMatrix::zeros(n, k);

        dict.as_mut_slice()
            .par_chunks_mut(n.max(1))
            .enumerate()
            .for_each(|(j, column)| {
                let comp = components.row_slice(j);
                for (i, slot) in column.iter_mut().enumerate() {
                    *slot = self.eval(x.row_slice(i), comp);
                }
            });

        dict
    }
}

/// Column-wise L2 norms of a dictionary.
///
/// Computed once per fit and shared read-only by every target column's
/// pursuit.
pub fn column_norms(dict: &ColMatrix) -> Vec<f32> {
    (0..dict.num_cols())
        .map(|j| {
            let sq: f64 = dict.col_slice(j).iter().map(|&v| (v as f64) * (v as f64)).sum();
            sq.sqrt() as f32
        })
        .collect()
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x as f64) * (y as f64))
        .sum()
}
