//! The step-strategy seam plus fixed-step baselines.
//!
//! One step advances the batch `x_t` from grid time `t` toward `t_next`
//! using velocity evaluations. The driver is agnostic to the formula: it
//! hands each strategy a [`StepContext`] and expects `x_t` to be mutated in
//! place. Baselines here are deterministic fixed-step methods; stochastic
//! variants plug in through the same trait and draw from `ctx.rng`.

use crate::field::{broadcast_time, VelocityField};
use crate::Result;
use ndarray::{Array2, ArrayView2};
use rand::RngCore;

/// Everything a strategy may touch while taking one step.
pub struct StepContext<'a> {
    /// The live batch, mutated in place to the next integration state.
    pub x_t: &'a mut Array2<f32>,
    /// Grid time the step starts from.
    pub t: f32,
    /// Grid time the step advances toward.
    pub t_next: f32,
    field: &'a dyn VelocityField,
    /// Run RNG, for stochastic strategies.
    pub rng: &'a mut dyn RngCore,
}

impl<'a> StepContext<'a> {
    pub fn new(
        x_t: &'a mut Array2<f32>,
        t: f32,
        t_next: f32,
        field: &'a dyn VelocityField,
        rng: &'a mut dyn RngCore,
    ) -> Self {
        Self {
            x_t,
            t,
            t_next,
            field,
            rng,
        }
    }

    /// Step size implied by the grid.
    pub fn dt(&self) -> f32 {
        self.t_next - self.t
    }

    /// Velocity at the current state and time.
    pub fn velocity(&self) -> Array2<f32> {
        self.velocity_at(&self.x_t.view(), self.t)
    }

    /// Velocity at an arbitrary `(x, t)`, with the scalar time broadcast to
    /// the batch dimension of `x`.
    pub fn velocity_at(&self, x: &ArrayView2<f32>, t: f32) -> Array2<f32> {
        let tb = broadcast_time(t, x.nrows());
        self.field.velocity(x, &tb.view())
    }
}

/// A pluggable integration rule.
///
/// Contract: mutate `ctx.x_t` in place from its value at `ctx.t` to its
/// value at `ctx.t_next`. Numerical failures (NaN velocities and the like)
/// are the strategy's to surface; the driver propagates them uncaught.
pub trait StepStrategy {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<()>;
}

/// Explicit Euler (1st order): `x += dt * v(x, t)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EulerStep;

impl StepStrategy for EulerStep {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<()> {
        let v = ctx.velocity();
        let dt = ctx.dt();
        let (n, d) = (ctx.x_t.nrows(), ctx.x_t.ncols());
        for i in 0..n {
            for k in 0..d {
                ctx.x_t[[i, k]] += dt * v[[i, k]];
            }
        }
        Ok(())
    }
}

/// Heun / explicit trapezoid / RK2 (2nd order).
#[derive(Debug, Clone, Copy, Default)]
pub struct HeunStep;

impl StepStrategy for HeunStep {
    fn step(&mut self, ctx: &mut StepContext<'_>) -> Result<()> {
        let v0 = ctx.velocity();
        let dt = ctx.dt();
        let (n, d) = (ctx.x_t.nrows(), ctx.x_t.ncols());

        // predictor
        let mut x_pred = ctx.x_t.clone();
        for i in 0..n {
            for k in 0..d {
                x_pred[[i, k]] += dt * v0[[i, k]];
            }
        }

        // corrector
        let v1 = ctx.velocity_at(&x_pred.view(), ctx.t_next);
        for i in 0..n {
            for k in 0..d {
                ctx.x_t[[i, k]] += 0.5 * dt * (v0[[i, k]] + v1[[i, k]]);
            }
        }
        Ok(())
    }
}
