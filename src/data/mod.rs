//! Dense matrix storage for dictionaries, samples, and coefficients.
//!
//! Two layouts are used throughout the crate:
//!
//! - [`RowMatrix`]: sample matrices (one point per row) and the per-output
//!   coefficient matrix of a fitted model.
//! - [`ColMatrix`]: dictionaries and target/prediction matrices, where the
//!   pursuit needs contiguous column access.

mod dense;
mod layout;

pub use dense::{ColMatrix, DenseMatrix, RowMatrix};
pub use layout::{ColMajor, Layout, RowMajor};
