//! Kernel matching pursuit regression example.
//!
//! Fits a sparse RBF model on synthetic data with a held-out validation
//! set, then reports the retained components and validation trace.
//!
//! Run with:
//! ```bash
//! cargo run --example train_regression
//! ```

use pursue_rs::data::RowMatrix;
use pursue_rs::estimator::{Budget, KmpParams, KmpRegressor, ValidationSet};
use pursue_rs::kernel::Kernel;
use pursue_rs::training::Verbosity;

fn main() {
    // =========================================================================
    // Synthetic data: y = sin(x) sampled on a grid with deterministic noise
    // =========================================================================
    let n_samples = 200;

    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let x = i as f32 / n_samples as f32 * 6.0;
        let noise = ((i * 31) % 100) as f32 / 1000.0 - 0.05;
        features.push(x);
        labels.push(x.sin() + noise);
    }

    let x_train = RowMatrix::from_vec(features[..160].to_vec(), 160, 1);
    let y_train = labels[..160].to_vec();
    let x_val = RowMatrix::from_vec(features[160..].to_vec(), 40, 1);
    let y_val = labels[160..].to_vec();

    // =========================================================================
    // Train
    // =========================================================================
    let params = KmpParams {
        n_nonzero_coefs: Budget::Count(30),
        n_components: Some(Budget::Count(80)),
        n_refit: 5,
        check_duplicates: true,
        kernel: Kernel::Rbf { gamma: 2.0 },
        epsilon: 1e-4,
        n_validate: 2,
        verbosity: Verbosity::Info,
        ..Default::default()
    };

    println!("Training kernel matching pursuit regressor...");
    let fit = KmpRegressor::new(params)
        .fit(&x_train, &y_train, Some(ValidationSet::new(&x_val, &y_val)))
        .expect("fit failed");

    // =========================================================================
    // Evaluate
    // =========================================================================
    let predictions = fit.model.predict(&x_val);
    let mse: f32 = predictions
        .iter()
        .zip(y_val.iter())
        .map(|(&p, &t)| (p - t) * (p - t))
        .sum::<f32>()
        / y_val.len() as f32;

    println!("Retained components: {}", fit.model.num_components());
    println!("Validation MSE: {mse:.6}");
    if let Some(trace) = fit.trace {
        for ((iter, train), val) in trace
            .iterations
            .iter()
            .zip(trace.training_scores.iter())
            .zip(trace.validation_scores.iter())
        {
            println!("  iter {iter:>3}  train {train:>10.6}  validation {val:>10.6}");
        }
    }
}
