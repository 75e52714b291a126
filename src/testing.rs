//! Testing utilities: assertion helpers shared by unit and integration
//! tests.

use approx::abs_diff_eq;

/// Default tolerance for floating point comparisons where values are O(1).
pub const DEFAULT_TOLERANCE: f32 = 1e-5;

/// Assert that two float values are approximately equal.
///
/// # Examples
///
/// ```
/// # use pursue_rs::assert_approx_eq;
/// assert_approx_eq!(1.0f32, 1.0001f32, 0.001);
/// ```
///
/// # Panics
///
/// Panics if the absolute difference exceeds tolerance.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left_val = $left;
        let right_val = $right;
        let tol = $tolerance;
        let diff = (left_val - right_val).abs();
        if diff > tol {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`\n right: `{:?}`\n  diff: `{:?}` > tolerance `{:?}`",
                left_val, right_val, diff, tol
            );
        }
    }};
}

/// Assert that two `f32` slices are element-wise approximately equal.
///
/// # Panics
///
/// Panics on length mismatch or any element differing by more than
/// `tolerance`.
pub fn assert_slice_approx_eq(left: &[f32], right: &[f32], tolerance: f32) {
    assert_eq!(
        left.len(),
        right.len(),
        "Slice lengths differ: {} vs {}",
        left.len(),
        right.len()
    );
    for (i, (&a, &b)) in left.iter().zip(right.iter()).enumerate() {
        assert!(
            abs_diff_eq!(a, b, epsilon = tolerance),
            "Slices differ at index {}: {} vs {} (tolerance {})",
            i,
            a,
            b,
            tolerance
        );
    }
}
