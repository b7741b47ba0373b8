//! The sampling loop driver.
//!
//! A [`Sampler`] owns everything one integration run needs: the velocity
//! field, the base distribution, a pluggable step strategy, observer
//! callbacks, a seedable RNG, and the run state (current batch, grid cursor,
//! trajectory buffers). Each `sample_loop` call is an independent episode;
//! the driver resets its run state at entry so nothing leaks between runs.

use crate::field::VelocityField;
use crate::grid::{resolve_time_grid, TimeGrid};
use crate::source::SourceDistribution;
use crate::step::{StepContext, StepStrategy};
use crate::{Error, Result};
use ndarray::Array2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Hard ceiling on steps per run, so a runaway grid cannot loop forever.
/// Hitting it ends the run normally; it is not an error.
pub const STEP_LIMIT: usize = 1000;

/// A run also stops once the current time is within this tolerance of the
/// end of the unit interval.
const END_TIME_TOL: f32 = 1e-6;

/// Construction-time defaults for a [`Sampler`].
///
/// `num_steps`, `time_grid` and `num_samples` can all be overridden per
/// call; `record_traj_period` and `seed` are fixed at construction (a
/// per-call `seed` reseeds the RNG for that call onward).
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Target step count; the grid gets `num_steps + 1` points.
    pub num_steps: Option<usize>,
    /// Explicit time grid. Takes effect together with `num_steps` per the
    /// rules in [`resolve_time_grid`].
    pub time_grid: Option<TimeGrid>,
    /// Recording cadence: a snapshot every this many steps. Must be >= 1.
    pub record_traj_period: usize,
    /// Seed for the driver-owned RNG.
    pub seed: u64,
    /// Default batch size when neither an initial value nor a per-call
    /// `num_samples` is given.
    pub num_samples: Option<usize>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_steps: None,
            time_grid: None,
            record_traj_period: 1,
            seed: 0,
            num_samples: None,
        }
    }
}

/// Per-call arguments to [`Sampler::sample_loop`]. Everything is optional;
/// `None` means "use the configured default".
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Batch size for this run. Resolution order: this field, then the row
    /// count of `x_0`, then the configured default.
    pub num_samples: Option<usize>,
    /// Explicit initial batch. When absent, the source distribution is
    /// sampled instead.
    pub x_0: Option<Array2<f32>>,
    /// Reseeds the driver RNG before anything else in the call.
    pub seed: Option<u64>,
    /// Overrides (and replaces) the configured `num_steps`.
    pub num_steps: Option<usize>,
    /// Overrides (and replaces) the configured `time_grid`.
    pub time_grid: Option<TimeGrid>,
}

/// Observer invoked once per recorded step, in registration order.
///
/// Callbacks see the full run state read-only. They are the crate's
/// observability surface; the driver itself never logs.
pub trait Callback {
    fn on_record(&mut self, run: &RunState);
}

/// The evolving state of one sampling run, plus its recorded output.
///
/// Owned exclusively by the driver while the run is live; exposed read-only
/// once `sample_loop` returns.
#[derive(Debug, Clone)]
pub struct RunState {
    x_t: Array2<f32>,
    x_0: Array2<f32>,
    grid: Vec<f32>,
    cursor: usize,
    t: f32,
    t_next: Option<f32>,
    step_count: usize,
    trajectories: Vec<Array2<f32>>,
    time_points: Vec<f32>,
}

impl RunState {
    fn new(x_init: Array2<f32>, grid: Vec<f32>) -> Result<Self> {
        if grid.len() < 2 {
            return Err(Error::Config(format!(
                "time grid needs at least 2 points to take a step (got {})",
                grid.len()
            )));
        }
        let t = grid[0];
        let t_next = Some(grid[1]);
        Ok(Self {
            x_0: x_init.clone(),
            trajectories: vec![x_init.clone()],
            time_points: vec![t],
            x_t: x_init,
            grid,
            cursor: 2,
            t,
            t_next,
            step_count: 0,
        })
    }

    fn should_stop(&self) -> bool {
        self.t_next.is_none()
            || self.step_count >= STEP_LIMIT
            || self.t >= 1.0 - END_TIME_TOL
    }

    /// Shift to the next grid interval: `t <- t_next`, pull the following
    /// grid value into `t_next` (`None` once the grid is exhausted).
    fn advance(&mut self) {
        if let Some(next) = self.t_next {
            self.t = next;
        }
        self.t_next = self.grid.get(self.cursor).copied();
        self.cursor += 1;
        self.step_count += 1;
    }

    /// Append a snapshot of the current batch and time.
    ///
    /// Snapshots must never alias the live `x_t` buffer; later steps mutate
    /// it in place.
    fn record(&mut self) {
        self.trajectories.push(self.x_t.clone());
        self.time_points.push(self.t);
    }

    /// The live (or, after the run, final) batch.
    pub fn x_t(&self) -> &Array2<f32> {
        &self.x_t
    }

    /// The run's initial batch, copied before the first step.
    pub fn x_0(&self) -> &Array2<f32> {
        &self.x_0
    }

    /// Current grid time.
    pub fn t(&self) -> f32 {
        self.t
    }

    /// Next grid time; `None` once the grid is exhausted.
    pub fn t_next(&self) -> Option<f32> {
        self.t_next
    }

    /// Steps taken so far in this run.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Recorded snapshots: the initial batch, then one copy every
    /// `record_traj_period` steps.
    pub fn trajectories(&self) -> &[Array2<f32>] {
        &self.trajectories
    }

    /// The grid time at which each snapshot in [`Self::trajectories`] was
    /// taken (1:1 with it).
    pub fn time_points(&self) -> &[f32] {
        &self.time_points
    }
}

/// ODE sampling driver for a flow model.
///
/// ```
/// use flowsample::sampler::{RunOptions, Sampler, SamplerConfig};
/// use flowsample::source::StandardNormalSource;
/// use flowsample::step::EulerStep;
/// use ndarray::{ArrayView1, ArrayView2};
///
/// // dx/dt = -x, integrated 0 -> 1 in 8 steps.
/// let field = |x: &ArrayView2<f32>, _t: &ArrayView1<f32>| x.mapv(|v| -v);
/// let mut sampler = Sampler::new(
///     field,
///     StandardNormalSource::new(2),
///     SamplerConfig {
///         num_steps: Some(8),
///         num_samples: Some(4),
///         ..SamplerConfig::default()
///     },
/// )
/// .with_strategy(EulerStep);
///
/// let run = sampler.sample_loop(RunOptions::default()).unwrap();
/// assert_eq!(run.trajectories().len(), 9);
/// assert_eq!(run.time_points().first(), Some(&0.0));
/// ```
pub struct Sampler<V, S> {
    field: V,
    source: S,
    strategy: Option<Box<dyn StepStrategy>>,
    callbacks: Vec<Box<dyn Callback>>,
    config: SamplerConfig,
    rng: ChaCha8Rng,
    run: Option<RunState>,
}

impl<V, S> Sampler<V, S>
where
    V: VelocityField,
    S: SourceDistribution,
{
    /// A driver with no step strategy attached; [`Self::with_strategy`]
    /// plugs one in. Calling [`Self::sample_loop`] without one fails with
    /// [`Error::UnimplementedStep`].
    pub fn new(field: V, source: S, config: SamplerConfig) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            field,
            source,
            strategy: None,
            callbacks: Vec::new(),
            config,
            rng,
            run: None,
        }
    }

    /// Attach the integration rule used for every step of every run.
    pub fn with_strategy(mut self, strategy: impl StepStrategy + 'static) -> Self {
        self.strategy = Some(Box::new(strategy));
        self
    }

    /// Register an observer; callbacks fire per recorded step, in
    /// registration order.
    pub fn with_callback(mut self, callback: impl Callback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// State of the most recent completed run, if any.
    pub fn last_run(&self) -> Option<&RunState> {
        self.run.as_ref()
    }

    /// Run one full sampling episode and return its completed state.
    ///
    /// The loop is `step -> advance -> record?` until a stop condition
    /// holds: grid exhausted, [`STEP_LIMIT`] reached, or the current time is
    /// within `1e-6` of the end of the unit interval. Because recording
    /// happens after the advance, snapshot `i` of a period-1 run is paired
    /// with grid time `t_i`. When a ceiling stops the run between recording
    /// points, the final state is recorded as a last snapshot.
    ///
    /// Configuration problems (`record_traj_period == 0`, unresolvable batch
    /// size, bad grid inputs, a grid with fewer than two points, no step
    /// strategy) fail fast before any state is touched. Step-strategy errors
    /// propagate unchanged; the previous run's state is dropped either way,
    /// so an aborted call leaves nothing to read.
    pub fn sample_loop(&mut self, opts: RunOptions) -> Result<&RunState> {
        let period = self.config.record_traj_period;
        if period == 0 {
            return Err(Error::Config("record_traj_period must be >= 1".into()));
        }
        self.run = None;

        if let Some(seed) = opts.seed {
            self.rng = ChaCha8Rng::seed_from_u64(seed);
        }

        let num_samples = opts
            .num_samples
            .or_else(|| opts.x_0.as_ref().map(|x| x.nrows()))
            .or(self.config.num_samples)
            .ok_or_else(|| {
                Error::Config("num_samples must be specified when no initial value is given".into())
            })?;
        self.config.num_samples = Some(num_samples);

        let x_init = match opts.x_0 {
            Some(x) => x,
            None => self.source.sample(num_samples, &mut self.rng),
        };

        // Per-call grid arguments replace the stored defaults for later runs.
        if opts.num_steps.is_some() {
            self.config.num_steps = opts.num_steps;
        }
        if opts.time_grid.is_some() {
            self.config.time_grid = opts.time_grid;
        }
        let (_num_steps, grid) =
            resolve_time_grid(self.config.num_steps, self.config.time_grid.as_ref())?;

        let mut run = RunState::new(x_init, grid)?;
        let strategy = self.strategy.as_mut().ok_or(Error::UnimplementedStep)?;

        while !run.should_stop() {
            if let Some(t_next) = run.t_next {
                let mut ctx =
                    StepContext::new(&mut run.x_t, run.t, t_next, &self.field, &mut self.rng);
                strategy.step(&mut ctx)?;
            }
            run.advance();
            if run.step_count % period == 0 {
                run.record();
                for callback in &mut self.callbacks {
                    callback.on_record(&run);
                }
            }
        }

        // A ceiling can cut the run short between recording points; the
        // trajectory still ends with the state actually reached. Grid
        // exhaustion (t_next == None) is a natural end and gets no extra
        // snapshot.
        if run.t_next.is_some() && run.step_count % period != 0 {
            run.record();
            for callback in &mut self.callbacks {
                callback.on_record(&run);
            }
        }

        Ok(self.run.insert(run))
    }
}
