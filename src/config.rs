//! Scheduler configuration — data structs with validation.

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Sleep-timer tuning.
///
/// Both fields are in seconds. `cancel_granularity` bounds how long a worker
/// sleeps between checks of the cancel predicate; `min_sleep_size` is the
/// threshold below which the timer spins instead of asking the OS to sleep.
/// Set `min_sleep_size` to something other than zero only if you need sleeps
/// shorter than your kernel's wakeup latency to land precisely; higher values
/// burn more CPU. `1e-4` is a reasonable starting point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Upper bound on a single uninterruptible OS sleep (default: 0.01).
    pub cancel_granularity: f64,
    /// Remainders below this are finished with a spin loop (default: 0.0).
    pub min_sleep_size: f64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            cancel_granularity: 0.01,
            min_sleep_size: 0.0,
        }
    }
}

impl TimerConfig {
    /// Check ranges: both non-negative and finite, and the spin limit
    /// strictly below the granularity (unless spinning is disabled).
    pub fn validate(&self) -> SchedulerResult<()> {
        if !self.cancel_granularity.is_finite() || self.cancel_granularity < 0.0 {
            return Err(SchedulerError::InvalidTimer(format!(
                "cancel_granularity {} must be non-negative and finite",
                self.cancel_granularity
            )));
        }
        if !self.min_sleep_size.is_finite() || self.min_sleep_size < 0.0 {
            return Err(SchedulerError::InvalidTimer(format!(
                "min_sleep_size {} must be non-negative and finite",
                self.min_sleep_size
            )));
        }
        if self.min_sleep_size > 0.0 && self.min_sleep_size >= self.cancel_granularity {
            return Err(SchedulerError::InvalidTimer(format!(
                "min_sleep_size {} must be strictly less than cancel_granularity {}",
                self.min_sleep_size, self.cancel_granularity
            )));
        }
        Ok(())
    }
}

/// Top-level scheduler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Number of worker threads (default: 1). More threads make timing more
    /// accurate at high total rates: each worker stretches its sleeps by the
    /// thread count, reducing the overhead-to-sleep ratio.
    pub threads: usize,
    /// PRNG seed; `None` seeds from the wall clock.
    pub seed: Option<u64>,
    /// Global speed multiplier, applied as a divisor to sampled delays
    /// (default: 1.0). Values above 1 make every category fire faster.
    pub scale: f64,
    /// Per-worker sleep-timer tuning.
    pub timer: TimerConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            seed: None,
            scale: 1.0,
            timer: TimerConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.threads == 0 {
            return Err(SchedulerError::InvalidThreadCount);
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SchedulerError::InvalidScale(self.scale));
        }
        self.timer.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SchedulerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_threads_rejected() {
        let config = SchedulerConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SchedulerError::InvalidThreadCount)
        ));
    }

    #[test]
    fn non_positive_scale_rejected() {
        for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = SchedulerConfig {
                scale,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "scale {scale} should fail");
        }
    }

    #[test]
    fn spin_limit_must_be_below_granularity() {
        let timer = TimerConfig {
            cancel_granularity: 0.001,
            min_sleep_size: 0.001,
        };
        assert!(timer.validate().is_err());

        let timer = TimerConfig {
            cancel_granularity: 0.01,
            min_sleep_size: 0.0001,
        };
        assert!(timer.validate().is_ok());
    }

    #[test]
    fn disabled_spin_is_valid_with_zero_granularity() {
        let timer = TimerConfig {
            cancel_granularity: 0.0,
            min_sleep_size: 0.0,
        };
        assert!(timer.validate().is_ok());
    }
}
