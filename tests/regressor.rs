//! End-to-end regression fits through the estimator facade.

use pursue_rs::data::{ColMatrix, RowMatrix};
use pursue_rs::estimator::{Budget, KmpParams, KmpRegressor, MatrixValidationSet, ValidationSet};
use pursue_rs::kernel::Kernel;
use pursue_rs::testing::assert_slice_approx_eq;
use pursue_rs::training::LossFunction;

/// 4 samples that are the rows of the identity: the linear-kernel
/// dictionary against themselves is the identity, so pursuit steps are
/// exact coordinate recoveries.
fn identity_samples() -> RowMatrix {
    RowMatrix::from_vec(
        vec![
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
        4,
        4,
    )
}

fn greedy_params(budget: usize) -> KmpParams {
    KmpParams {
        n_nonzero_coefs: Budget::Count(budget),
        n_refit: 0,
        check_duplicates: true,
        ..Default::default()
    }
}

#[test]
fn single_step_recovers_a_spike_exactly() {
    let x = identity_samples();
    let y = vec![1.0, 0.0, 0.0, 0.0];

    let fit = KmpRegressor::new(greedy_params(1)).fit(&x, &y, None).unwrap();

    assert_eq!(fit.model.num_components(), 1);
    assert_eq!(fit.model.num_outputs(), 1);
    assert_slice_approx_eq(&fit.model.predict(&x), &y, 1e-6);
    assert!(fit.trace.is_none());
}

#[test]
fn two_steps_recover_two_spikes_exactly() {
    let x = identity_samples();
    let y = vec![1.0, 1.0, 0.0, 0.0];

    let fit = KmpRegressor::new(greedy_params(2)).fit(&x, &y, None).unwrap();

    assert_eq!(fit.model.num_components(), 2);
    assert_slice_approx_eq(fit.model.coefficients().row_slice(0), &[1.0, 1.0], 1e-6);
    assert_slice_approx_eq(&fit.model.predict(&x), &y, 1e-6);
}

#[test]
fn pruned_components_stay_in_lockstep_with_coefficients() {
    let x = identity_samples();
    let y = vec![0.0, 2.0, 0.0, 0.0];

    let fit = KmpRegressor::new(greedy_params(1)).fit(&x, &y, None).unwrap();

    assert_eq!(
        fit.model.coefficients().num_cols(),
        fit.model.num_components()
    );
    // The kept component is the second sample.
    assert_eq!(fit.model.components().row_slice(0), &[0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn fractional_budget_selects_that_share_of_components() {
    let x = RowMatrix::from_vec(
        vec![
            0.9, 0.1, 0.3, //
            0.2, 0.8, 0.4, //
            0.1, 0.3, 0.9, //
            0.7, 0.2, 0.1, //
            0.3, 0.6, 0.2, //
            0.5, 0.5, 0.7, //
            0.2, 0.9, 0.1, //
            0.8, 0.4, 0.6, //
            0.4, 0.1, 0.8, //
            0.6, 0.7, 0.3,
        ],
        10,
        3,
    );
    let y = vec![1.0, -0.5, 0.3, 0.8, -0.2, 0.6, -0.7, 0.4, 0.1, 0.9];

    let fit = KmpRegressor::new(KmpParams {
        n_nonzero_coefs: Budget::Fraction(0.3),
        n_refit: 0,
        check_duplicates: true,
        ..Default::default()
    })
    .fit(&x, &y, None)
    .unwrap();

    // int(0.3 * 10) = 3 distinct selections.
    assert_eq!(fit.model.num_components(), 3);
}

#[test]
fn rbf_interpolates_with_full_budget_and_refit() {
    let x = RowMatrix::from_vec(vec![0.0, 0.5, 1.3, 2.0, 2.8], 5, 1);
    let y = vec![1.0, -1.0, 0.5, 2.0, -0.5];

    let fit = KmpRegressor::new(KmpParams {
        n_nonzero_coefs: Budget::Count(5),
        n_refit: 1,
        check_duplicates: true,
        kernel: Kernel::Rbf { gamma: 1.0 },
        ..Default::default()
    })
    .fit(&x, &y, None)
    .unwrap();

    // Full-rank Gram matrix plus a final joint refit: exact interpolation.
    assert_slice_approx_eq(&fit.model.predict(&x), &y, 1e-3);
}

#[test]
fn squared_loss_matches_residual_tracking() {
    let x = RowMatrix::from_vec(
        vec![
            0.9, 0.1, 0.3, //
            0.2, 0.8, 0.4, //
            0.1, 0.3, 0.9, //
            0.7, 0.2, 0.1, //
            0.3, 0.6, 0.2,
        ],
        5,
        3,
    );
    let y = vec![1.0, -0.5, 0.3, 0.8, -0.2];

    let base = KmpParams {
        n_nonzero_coefs: Budget::Count(4),
        n_refit: 0,
        check_duplicates: true,
        ..Default::default()
    };
    let tracked = KmpRegressor::new(base.clone()).fit(&x, &y, None).unwrap();
    let gradient = KmpRegressor::new(KmpParams {
        loss: Some(LossFunction::Squared),
        ..base
    })
    .fit(&x, &y, None)
    .unwrap();

    assert_eq!(
        tracked.model.num_components(),
        gradient.model.num_components()
    );
    assert_slice_approx_eq(
        tracked.model.coefficients().row_slice(0),
        gradient.model.coefficients().row_slice(0),
        1e-5,
    );
}

#[test]
fn scaled_dictionary_round_trips_through_prediction() {
    let x = identity_samples();
    let y = vec![1.0, 0.0, 0.0, 0.0];

    let fit = KmpRegressor::new(KmpParams {
        scale: true,
        ..greedy_params(1)
    })
    .fit(&x, &y, None)
    .unwrap();

    // One step on the standardized dictionary: every identity column has
    // mean 0.25 and std sqrt(0.1875); the selected scaled column gets step
    // corr/norm, so the prediction is exactly e0 - 0.25.
    assert_eq!(fit.model.num_components(), 1);
    assert_slice_approx_eq(
        &fit.model.predict(&x),
        &[0.75, -0.25, -0.25, -0.25],
        1e-4,
    );
}

#[test]
fn dedicated_thread_pool_matches_global_pool() {
    let x = identity_samples();
    let targets = ColMatrix::from_vec(
        vec![
            1.0, 0.5, 0.0, 0.0, //
            0.0, 0.0, 2.0, 1.0,
        ],
        4,
        2,
    );

    let sequential = KmpRegressor::new(greedy_params(2))
        .fit_multi(&x, &targets, None)
        .unwrap();
    let pooled = KmpRegressor::new(KmpParams {
        n_threads: 2,
        ..greedy_params(2)
    })
    .fit_multi(&x, &targets, None)
    .unwrap();

    assert_eq!(
        sequential.model.coefficients(),
        pooled.model.coefficients()
    );
}

#[test]
fn multi_output_fits_each_column_independently() {
    let x = identity_samples();
    let targets = ColMatrix::from_vec(
        vec![
            1.0, 0.0, 0.0, 0.0, //
            0.0, 0.0, 0.0, 2.0,
        ],
        4,
        2,
    );

    let fit = KmpRegressor::new(greedy_params(1))
        .fit_multi(&x, &targets, None)
        .unwrap();

    // Each column kept its own component; none are shared.
    assert_eq!(fit.model.num_outputs(), 2);
    assert_eq!(fit.model.num_components(), 2);

    let scores = fit.model.decision_function(&x);
    assert_slice_approx_eq(scores.col_slice(0), targets.col_slice(0), 1e-6);
    assert_slice_approx_eq(scores.col_slice(1), targets.col_slice(1), 1e-6);
}

#[test]
fn validation_keeps_best_snapshot_and_records_trace() {
    let x = identity_samples();
    let y = vec![1.0, 0.5, 0.25, 0.125];

    // The validation set rewards only the first component and punishes the
    // second, so the first checkpoint scores best and later ones plateau.
    let x_val = RowMatrix::from_vec(
        vec![
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0,
        ],
        2,
        4,
    );
    let y_val = vec![1.0, -0.5];

    let fit = KmpRegressor::new(KmpParams {
        epsilon: 1e-3,
        ..greedy_params(4)
    })
    .fit(&x, &y, Some(ValidationSet::new(&x_val, &y_val)))
    .unwrap();

    let trace = fit.trace.expect("validation trace");
    assert_eq!(trace.iterations, vec![1, 2, 3]);
    assert!(trace.validation_scores[0] > trace.validation_scores[1]);

    // Best snapshot is the single-component model from checkpoint 1.
    assert_eq!(fit.model.num_components(), 1);
    assert_slice_approx_eq(&fit.model.predict(&x), &[1.0, 0.0, 0.0, 0.0], 1e-6);
}

#[test]
fn validation_with_matrix_targets() {
    let x = identity_samples();
    let targets = ColMatrix::from_vec(vec![1.0, 0.5, 0.0, 0.0], 4, 1);
    let val_targets = ColMatrix::from_vec(vec![1.0, 0.5, 0.0, 0.0], 4, 1);

    let fit = KmpRegressor::new(KmpParams {
        n_validate: 2,
        ..greedy_params(4)
    })
    .fit_multi(
        &x,
        &targets,
        Some(MatrixValidationSet::new(&x, &val_targets)),
    )
    .unwrap();

    let trace = fit.trace.expect("validation trace");
    assert_eq!(trace.iterations, vec![2, 4]);
    assert_eq!(trace.training_scores.len(), trace.validation_scores.len());
}

#[test]
fn component_subsampling_bounds_the_dictionary() {
    let x = RowMatrix::from_vec(
        vec![
            0.9, 0.1, //
            0.2, 0.8, //
            0.1, 0.3, //
            0.7, 0.2, //
            0.3, 0.6, //
            0.5, 0.5, //
            0.2, 0.9, //
            0.8, 0.4,
        ],
        8,
        2,
    );
    let y = vec![1.0, -0.5, 0.3, 0.8, -0.2, 0.6, -0.7, 0.4];

    let fit = KmpRegressor::new(KmpParams {
        n_nonzero_coefs: Budget::Count(2),
        n_components: Some(Budget::Count(4)),
        n_refit: 0,
        check_duplicates: true,
        ..Default::default()
    })
    .fit(&x, &y, None)
    .unwrap();

    assert!(fit.model.num_components() <= 4);
    assert!(fit.model.num_components() >= 1);
}
