//! # flowsample
//!
//! A sampling-loop driver for continuous-time flow models.
//!
//! Sampling from a learned flow means integrating the ODE
//! \[
//! \frac{dx}{dt} = v_\theta(x,t;\cdot)
//! \]
//! from a base sample `x_0` at `t = 0` to a target sample at `t = 1`.
//! This crate owns the *driver* side of that computation:
//!
//! - discretizing `[0,1]` into a time grid (`grid`),
//! - iterating a pluggable integration step across the grid (`sampler`, `step`),
//! - recording intermediate states at a configurable cadence,
//! - notifying observer callbacks and enforcing termination.
//!
//! It deliberately does **not** own the velocity-field model, its training,
//! or the base distribution; those plug in through small traits (`field`,
//! `source`).
//!
//! ## Public invariants (must not change)
//!
//! - **Determinism knobs are explicit**: the driver owns a seedable RNG; a
//!   `seed` in the config (or per call) fully determines source draws and any
//!   stochastic step strategy. There is no hidden global random state.
//! - **Recorded snapshots never alias live state**: every trajectory entry is
//!   a detached copy, so later in-place steps cannot corrupt the record.
//! - **Bounded runs**: a sampling run takes at most [`sampler::STEP_LIMIT`]
//!   steps regardless of the supplied grid.
//!
//! ## References (conceptual anchors; not "implemented fully")
//!
//! - Lipman et al., *Flow Matching for Generative Modeling* (arXiv:2210.02747).
//! - Liu et al., *Flow Straight and Fast: Learning to Generate and Transfer
//!   Data with Rectified Flow* (arXiv:2209.03003): the sampling-loop shape
//!   (fixed grids, few-step Euler) this driver targets.
//!
//! ## Module map
//!
//! - `grid`: time-grid construction and normalization
//! - `sampler`: the sampling loop driver (run state, record/advance/stop)
//! - `step`: the step-strategy seam plus fixed-step `Euler`/`Heun` baselines
//! - `field`: the velocity-field evaluation seam
//! - `source`: the base-distribution seam (`x_0` sampling)

pub mod field;
pub mod grid;
pub mod sampler;
pub mod source;
pub mod step;

/// flowsample error variants.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or insufficient grid/sample-count configuration. Fatal to the
    /// call that raised it; nothing is retried.
    #[error("invalid configuration: {0}")]
    Config(String),
    /// The driver was asked to integrate without a concrete step strategy.
    #[error("no step strategy attached; attach one before calling sample_loop")]
    UnimplementedStep,
}

pub type Result<T> = std::result::Result<T, Error>;
