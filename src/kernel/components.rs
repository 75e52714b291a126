//! Basis component subsampling.
//!
//! Components are training samples kept as kernel centers. When the caller
//! does not supply an explicit component set, a subset of the training
//! samples is drawn here, optionally respecting the label distribution.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::RowMatrix;

/// How subsampled components are distributed over classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassDistrib {
    /// Uniformly random over all samples.
    #[default]
    Random,
    /// The same number of components for every class.
    Balanced,
    /// Components proportional to each class frequency.
    Stratified,
}

/// Component subsampling errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComponentError {
    #[error("n_components must be positive")]
    ZeroComponents,

    #[error("n_components ({requested}) cannot exceed the number of samples ({available})")]
    TooManyComponents { requested: usize, available: usize },
}

/// Select `n_components` rows of `x` as basis components.
///
/// `None` keeps every sample. The selection shuffles sample indices with a
/// seeded [`Xoshiro256PlusPlus`] so the same seed always yields the same
/// component set. For [`ClassDistrib::Balanced`] each distinct value of
/// `y` contributes `n_components / n_classes` components; for
/// [`ClassDistrib::Stratified`] each contributes proportionally to its
/// frequency.
///
/// # Panics
///
/// Panics if `y.len() != x.num_rows()`.
pub fn select_components(
    x: &RowMatrix,
    y: &[f32],
    n_components: Option<usize>,
    distrib: ClassDistrib,
    seed: u64,
) -> Result<RowMatrix, ComponentError> {
    assert_eq!(y.len(), x.num_rows(), "Label length must match sample count");

    let n_samples = x.num_rows();

    let n_components = match n_components {
        None => return Ok(x.clone()),
        Some(0) => return Err(ComponentError::ZeroComponents),
        Some(n) if n > n_samples => {
            return Err(ComponentError::TooManyComponents {
                requested: n,
                available: n_samples,
            })
        }
        Some(n) if n == n_samples => return Ok(x.clone()),
        Some(n) => n,
    };

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut indices: Vec<usize> = (0..n_samples).collect();
    indices.shuffle(&mut rng);

    let selected: Vec<usize> = match distrib {
        ClassDistrib::Random => indices[..n_components].to_vec(),
        ClassDistrib::Balanced => {
            let classes = distinct_classes(y);
            let per_class = n_components / classes.len();
            take_per_class(&indices, y, &classes, |_| per_class)
        }
        ClassDistrib::Stratified => {
            let classes = distinct_classes(y);
            take_per_class(&indices, y, &classes, |class| {
                let count = y.iter().filter(|&&v| v == class).count();
                n_components * count / n_samples
            })
        }
    };

    let rows: Vec<&[f32]> = selected.iter().map(|&i| x.row_slice(i)).collect();
    Ok(RowMatrix::from_rows(&rows, x.num_cols()))
}

/// Distinct label values in ascending order.
fn distinct_classes(y: &[f32]) -> Vec<f32> {
    let mut classes = y.to_vec();
    classes.sort_by(|a, b| a.total_cmp(b));
    classes.dedup();
    classes
}

/// For each class, take the first `quota(class)` shuffled indices whose
/// label matches it.
fn take_per_class<F>(indices: &[usize], y: &[f32], classes: &[f32], quota: F) -> Vec<usize>
where
    F: Fn(f32) -> usize,
{
    let mut selected = Vec::new();
    for &class in classes {
        let n = quota(class);
        selected.extend(indices.iter().copied().filter(|&i| y[i] == class).take(n));
    }
    selected
}
