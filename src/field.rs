//! The velocity-field evaluation seam.
//!
//! The driver never knows what the model is; it only needs a way to evaluate
//! \(v(x, t)\) on a batch of states. Time enters as a per-sample vector so a
//! field conditioned on per-sample times (the common case in flow-matching
//! models) needs no special casing.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// A time-dependent velocity field evaluated on a batch.
///
/// - `x`: `n×d` batch of states (rows are samples).
/// - `t`: length-`n` vector of times, one per row of `x`.
///
/// Returns the `n×d` batch of velocities. The driver broadcasts its scalar
/// current time to a per-sample vector before calling this (see
/// [`broadcast_time`]).
pub trait VelocityField {
    fn velocity(&self, x: &ArrayView2<f32>, t: &ArrayView1<f32>) -> Array2<f32>;
}

/// Closures are fields: `|x, t| ...` is all a test or a simple analytic
/// model needs.
impl<F> VelocityField for F
where
    F: Fn(&ArrayView2<f32>, &ArrayView1<f32>) -> Array2<f32>,
{
    fn velocity(&self, x: &ArrayView2<f32>, t: &ArrayView1<f32>) -> Array2<f32> {
        self(x, t)
    }
}

/// Broadcast a scalar time to a per-sample time vector of length
/// `num_samples`, matching the batch dimension of the state it accompanies.
pub fn broadcast_time(t: f32, num_samples: usize) -> Array1<f32> {
    Array1::from_elem(num_samples, t)
}
