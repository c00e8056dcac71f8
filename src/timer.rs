//! Precise cancelable sleep with drift correction.
//!
//! [`PreciseTimer`] sleeps toward an absolute deadline rather than for a
//! relative duration: each `sleep_for` advances the internal target by the
//! *requested* time, independent of how long the OS actually slept, so
//! oversleep on one call is paid back on the next. Sleeps are chopped into
//! `cancel_granularity` chunks with a cancel predicate polled in between,
//! and an optional spin tail finishes remainders too short for the kernel
//! to honor.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::TimerConfig;

/// A drift-corrected, cancelable sleep primitive.
///
/// Implementations are deliberately not `Sync`: every scheduler worker owns
/// its own timer, and sharing one would corrupt the running deadline.
pub trait SleepTimer: Send {
    /// Reset the running deadline to "now", discarding accumulated drift.
    fn mark(&mut self);

    /// Advance the deadline by `duration` and sleep until it is reached or
    /// `cancel` reports true. A canceled sleep calls [`SleepTimer::mark`]
    /// so the unslept remainder is not credited to the next call.
    fn sleep_for(&mut self, duration: Duration, cancel: Option<&dyn Fn() -> bool>);
}

/// Shared constructor for per-worker timers.
pub type TimerFactory = Arc<dyn Fn() -> Box<dyn SleepTimer> + Send + Sync>;

/// The default [`SleepTimer`]: chunked OS sleeps plus an optional spin tail.
///
/// `cancel_granularity` bounds how stale a cancelation check can be; don't
/// count on cancelation being instant. `min_sleep_size` trades CPU for
/// precision on sub-kernel-latency sleeps and should stay well below the
/// granularity; zero disables the spin tail entirely.
pub struct PreciseTimer {
    cancel_granularity: Duration,
    min_sleep_size: Duration,
    base_time: Instant,
}

impl Default for PreciseTimer {
    fn default() -> Self {
        Self::new(Duration::from_millis(10), Duration::ZERO)
    }
}

impl PreciseTimer {
    pub fn new(cancel_granularity: Duration, min_sleep_size: Duration) -> Self {
        Self {
            cancel_granularity,
            min_sleep_size,
            base_time: Instant::now(),
        }
    }

    /// Build from a validated [`TimerConfig`] (seconds as `f64`).
    pub fn from_config(config: &TimerConfig) -> Self {
        Self::new(
            Duration::from_secs_f64(config.cancel_granularity),
            Duration::from_secs_f64(config.min_sleep_size),
        )
    }

    fn spin_finish(&self) {
        while Instant::now() < self.base_time {
            std::hint::spin_loop();
        }
    }
}

impl SleepTimer for PreciseTimer {
    fn mark(&mut self) {
        self.base_time = Instant::now();
    }

    fn sleep_for(&mut self, duration: Duration, cancel: Option<&dyn Fn() -> bool>) {
        self.base_time += duration;
        let mut canceled = false;

        loop {
            let now = Instant::now();
            if now >= self.base_time {
                break;
            }
            let remaining = self.base_time - now;
            if remaining < self.min_sleep_size {
                self.spin_finish();
                break;
            }
            let chunk = remaining
                .min(self.cancel_granularity)
                .saturating_sub(self.min_sleep_size);
            std::thread::sleep(chunk);
            if let Some(cancel) = cancel {
                if cancel() {
                    canceled = true;
                    break;
                }
            }
        }

        if canceled {
            // Absorb the unslept remainder instead of crediting it forward.
            self.mark();
        }
    }
}
