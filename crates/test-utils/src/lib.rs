//! Test support for the decoder crates.
//!
//! - [`generators`]: builders that write grid, init and summary files through
//!   the real container writer
//! - [`fixtures`]: ready-made summary cases
//! - [`paths`]: reference data lookup and temporary directories
//!
//! Reference decks (e.g. `NORNE_ATW2013.EGRID`) are not checked in. Tests that
//! need them use [`require_test_file!`] and are skipped when the file is
//! missing.

pub mod fixtures;
pub mod generators;
pub mod paths;

pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Resolve a reference data file or return from the test early.
///
/// ```ignore
/// use test_utils::require_test_file;
///
/// #[test]
/// fn test_norne_grid() {
///     let path = require_test_file!("NORNE_ATW2013.EGRID");
///     let grid = grid_geometry::EGrid::open(&path).unwrap();
/// }
/// ```
#[macro_export]
macro_rules! require_test_file {
    ($name:expr) => {{
        match $crate::find_test_file($name) {
            Some(path) => path,
            None => {
                eprintln!(
                    "SKIPPED: Test file '{}' not found. Download test data or set TEST_DATA_DIR.",
                    $name
                );
                return;
            }
        }
    }};
}

/// Assert two numbers differ by at most `epsilon`. Both sides are compared
/// as `f64`.
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert two `[x, y, z]` corner points agree component-wise.
///
/// ```ignore
/// assert_point_approx_eq!(corners[4], [110.0, 0.0, 2010.0], 1e-9);
/// ```
#[macro_export]
macro_rules! assert_point_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        for axis in 0..3 {
            let diff = (left[axis] as f64 - right[axis] as f64).abs();
            if diff > $epsilon as f64 {
                panic!(
                    "assertion failed: `(left ≈ right)` on axis {}\n  left: `{:?}`,\n right: `{:?}`",
                    axis, left, right
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_approx_eq_within_epsilon() {
        assert_approx_eq!(2000.0001_f32, 2000.0, 0.001);
        assert_approx_eq!(0.3048, 0.3048_f64, 0.0);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_approx_eq_outside_epsilon() {
        assert_approx_eq!(30.5, 30.48, 0.001);
    }

    #[test]
    fn test_point_approx_eq() {
        assert_point_approx_eq!([100.0, 0.0, 2010.0], [100.0, 0.0, 2010.0000001], 1e-6);
    }

    #[test]
    #[should_panic(expected = "on axis 2")]
    fn test_point_approx_eq_reports_axis() {
        assert_point_approx_eq!([0.0, 0.0, 2000.0], [0.0, 0.0, 2010.0], 1e-6);
    }
}
