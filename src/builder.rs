//! Builder for explicit pre-construction scheduler configuration.
//!
//! [`SchedulerBuilder`] is the fluent counterpart to
//! [`SchedulerConfig`](crate::config::SchedulerConfig): everything is
//! validated at [`SchedulerBuilder::build`] time, so a misconfigured
//! scheduler is an `Err`, never a half-working object.
//!
//! ```
//! use poisson_scheduler::PoissonScheduler;
//!
//! let scheduler = PoissonScheduler::<&str>::builder()
//!     .threads(4)
//!     .seed(1234)
//!     .scale(2.0)
//!     .cancel_granularity(0.005)
//!     .min_sleep_size(1e-4)
//!     .build()
//!     .expect("valid configuration");
//! assert!(scheduler.is_stopped());
//! ```

use std::fmt::Debug;

use crate::config::{SchedulerConfig, TimerConfig};
use crate::error::SchedulerResult;
use crate::poisson_queue::PoissonQueue;
use crate::scheduler::PoissonScheduler;
use crate::timer::TimerFactory;

/// Fluent configuration for [`PoissonScheduler`] / [`PoissonQueue`].
///
/// Created with [`PoissonScheduler::builder`]. Unset fields keep the
/// [`SchedulerConfig`] defaults: one worker, wall-clock seed, scale 1,
/// 10 ms cancel granularity, no spin tail.
#[derive(Clone, Default)]
pub struct SchedulerBuilder {
    config: SchedulerConfig,
    timer_factory: Option<TimerFactory>,
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing config instead of the defaults.
    pub fn from_config(config: SchedulerConfig) -> Self {
        Self {
            config,
            timer_factory: None,
        }
    }

    /// Number of worker threads.
    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    /// Deterministic PRNG seed (worker `i` uses `seed ^ i`).
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Global speed multiplier applied as a divisor to sampled delays.
    pub fn scale(mut self, scale: f64) -> Self {
        self.config.scale = scale;
        self
    }

    /// Upper bound on a single uninterruptible OS sleep, in seconds.
    pub fn cancel_granularity(mut self, seconds: f64) -> Self {
        self.config.timer.cancel_granularity = seconds;
        self
    }

    /// Spin-tail threshold, in seconds; zero disables spinning.
    pub fn min_sleep_size(mut self, seconds: f64) -> Self {
        self.config.timer.min_sleep_size = seconds;
        self
    }

    /// Replace the whole timer tuning block.
    pub fn timer(mut self, timer: TimerConfig) -> Self {
        self.config.timer = timer;
        self
    }

    /// Use a custom per-worker timer constructor instead of
    /// [`PreciseTimer`](crate::timer::PreciseTimer). Overrides the timer
    /// tuning fields.
    pub fn timer_factory(mut self, factory: TimerFactory) -> Self {
        self.timer_factory = Some(factory);
        self
    }

    /// Validate and construct the scheduler.
    pub fn build<K>(self) -> SchedulerResult<PoissonScheduler<K>>
    where
        K: Ord + Clone + Send + Sync + Debug + 'static,
    {
        let scheduler = PoissonScheduler::from_config(&self.config)?;
        if let Some(factory) = self.timer_factory {
            scheduler.set_timer_factory(factory);
        }
        Ok(scheduler)
    }

    /// Validate and construct a [`PoissonQueue`] over the scheduler.
    pub fn build_queue<K, T>(self) -> SchedulerResult<PoissonQueue<K, T>>
    where
        K: Ord + Clone + Send + Sync + Debug + 'static,
        T: Send + 'static,
    {
        Ok(PoissonQueue::with_scheduler(self.build()?))
    }
}

impl<K: Ord + Clone + Send + Sync + Debug + 'static> PoissonScheduler<K> {
    /// Fluent configuration entry point.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }
}
