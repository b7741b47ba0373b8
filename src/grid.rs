//! Time-grid construction for sampling runs.
//!
//! A sampling run integrates over an ordered sequence of time values
//! `t_0..t_n` spanning `[0,1]`. The grid either comes from a step count
//! (evenly spaced, closed interval) or is supplied explicitly by the caller.

use crate::{Error, Result};
use ndarray::{Array1, ArrayView1};

/// An explicit time grid, normalized to a plain vector of scalars.
///
/// Callers hold time points in whatever shape is convenient (a `Vec`, a
/// slice, an `ndarray` vector); `From` impls adapt all of them here so the
/// driver only ever deals with `&[f32]`.
///
/// Beyond length checks, nothing is validated: a non-monotonic or
/// out-of-`[0,1]` grid is passed through untouched (reverse-time grids are a
/// legitimate use).
#[derive(Debug, Clone, PartialEq)]
pub struct TimeGrid(Vec<f32>);

impl TimeGrid {
    pub fn points(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for TimeGrid {
    fn from(points: Vec<f32>) -> Self {
        TimeGrid(points)
    }
}

impl From<&[f32]> for TimeGrid {
    fn from(points: &[f32]) -> Self {
        TimeGrid(points.to_vec())
    }
}

impl<const N: usize> From<[f32; N]> for TimeGrid {
    fn from(points: [f32; N]) -> Self {
        TimeGrid(points.to_vec())
    }
}

impl From<Array1<f32>> for TimeGrid {
    fn from(points: Array1<f32>) -> Self {
        TimeGrid(points.to_vec())
    }
}

impl From<ArrayView1<'_, f32>> for TimeGrid {
    fn from(points: ArrayView1<'_, f32>) -> Self {
        TimeGrid(points.to_vec())
    }
}

/// Resolve `(num_steps, time_grid)` inputs into a concrete grid.
///
/// - neither given: error;
/// - only `num_steps`: `num_steps + 1` evenly spaced points covering `[0,1]`
///   inclusive;
/// - only `time_grid`: the grid as-is, with `num_steps = len - 1`;
/// - both: the grid as-is, provided `len == num_steps + 1`.
pub fn resolve_time_grid(
    num_steps: Option<usize>,
    time_grid: Option<&TimeGrid>,
) -> Result<(usize, Vec<f32>)> {
    match (num_steps, time_grid) {
        (None, None) => Err(Error::Config(
            "at least one of num_steps or time_grid must be provided".into(),
        )),
        (Some(n), None) => Ok((n, linspace_unit(n))),
        (None, Some(g)) => {
            if g.is_empty() {
                return Err(Error::Config("time_grid must not be empty".into()));
            }
            Ok((g.len() - 1, g.points().to_vec()))
        }
        (Some(n), Some(g)) => {
            if g.len() != n + 1 {
                return Err(Error::Config(format!(
                    "time_grid must have num_steps + 1 elements (got {} for num_steps = {})",
                    g.len(),
                    n
                )));
            }
            Ok((n, g.points().to_vec()))
        }
    }
}

/// `num_steps + 1` evenly spaced points over the closed interval `[0,1]`.
fn linspace_unit(num_steps: usize) -> Vec<f32> {
    if num_steps == 0 {
        return vec![0.0];
    }
    Array1::linspace(0.0f32, 1.0, num_steps + 1).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn neither_input_is_an_error() {
        assert!(resolve_time_grid(None, None).is_err());
    }

    #[test]
    fn steps_only_builds_closed_unit_linspace() {
        let (n, g) = resolve_time_grid(Some(4), None).unwrap();
        assert_eq!(n, 4);
        assert_eq!(g.len(), 5);
        let expected = [0.0f32, 0.25, 0.5, 0.75, 1.0];
        for (a, b) in g.iter().zip(expected.iter()) {
            assert!((a - b).abs() <= 1e-6, "got {a}, expected {b}");
        }
    }

    #[test]
    fn grid_only_derives_num_steps_and_preserves_order() {
        let grid = TimeGrid::from(vec![0.0f32, 0.1, 0.4, 1.0]);
        let (n, g) = resolve_time_grid(None, Some(&grid)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(g, vec![0.0, 0.1, 0.4, 1.0]);
    }

    #[test]
    fn mismatched_lengths_error_and_matching_lengths_pass() {
        let grid = TimeGrid::from(vec![0.0f32, 0.5, 1.0]);
        assert!(resolve_time_grid(Some(3), Some(&grid)).is_err());
        let (n, g) = resolve_time_grid(Some(2), Some(&grid)).unwrap();
        assert_eq!(n, 2);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn empty_grid_is_an_error() {
        let grid = TimeGrid::from(Vec::<f32>::new());
        assert!(resolve_time_grid(None, Some(&grid)).is_err());
    }

    #[test]
    fn ndarray_grids_normalize_to_plain_scalars() {
        let a = Array1::from_vec(vec![0.0f32, 0.5, 1.0]);
        let from_owned = TimeGrid::from(a.clone());
        let from_view = TimeGrid::from(a.view());
        assert_eq!(from_owned.points(), &[0.0, 0.5, 1.0]);
        assert_eq!(from_owned, from_view);
        assert_eq!(TimeGrid::from([0.0f32, 0.5, 1.0]).points(), &[0.0, 0.5, 1.0]);
    }

    #[test]
    fn non_monotonic_grids_pass_through_untouched() {
        let grid = TimeGrid::from(vec![0.0f32, 0.9, 0.3, 1.2]);
        let (n, g) = resolve_time_grid(None, Some(&grid)).unwrap();
        assert_eq!(n, 3);
        assert_eq!(g, vec![0.0, 0.9, 0.3, 1.2]);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_linspace_has_endpoints_and_even_gaps(num_steps in 1usize..400) {
            let (n, g) = resolve_time_grid(Some(num_steps), None).unwrap();
            prop_assert_eq!(n, num_steps);
            prop_assert_eq!(g.len(), num_steps + 1);
            prop_assert!(g[0].abs() <= 1e-6);
            prop_assert!((g[num_steps] - 1.0).abs() <= 1e-5);

            let target = 1.0f32 / num_steps as f32;
            for w in g.windows(2) {
                let gap = w[1] - w[0];
                prop_assert!(
                    (gap - target).abs() <= 1e-5,
                    "uneven gap {} (expected {})", gap, target
                );
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 64,
            .. ProptestConfig::default()
        })]
        #[test]
        fn prop_explicit_grid_round_trips(
            points in prop::collection::vec(-2.0f32..2.0f32, 1..64),
        ) {
            let grid = TimeGrid::from(points.clone());
            let (n, g) = resolve_time_grid(None, Some(&grid)).unwrap();
            prop_assert_eq!(n, points.len() - 1);
            prop_assert_eq!(g, points);
        }
    }
}
