//! Unified error handling for the scheduler library.
//!
//! Only *data* problems surface as errors: configuration validation and the
//! checked construction paths. Misuse of a live object (starting a running
//! scheduler, stopping it from one of its own workers, unbalanced in-flight
//! accounting) is a contract violation and panics instead — see the module
//! docs on [`crate::scheduler`].

use thiserror::Error;

/// Main error type for scheduler construction and configuration.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Worker thread count must be at least 1.
    #[error("invalid thread count: at least one worker thread is required")]
    InvalidThreadCount,

    /// Rates must be positive and finite; zero means "category absent".
    #[error("invalid rate {0}: rates must be positive and finite")]
    InvalidRate(f64),

    /// The global scale must be positive and finite.
    #[error("invalid scale {0}: scale must be positive and finite")]
    InvalidScale(f64),

    /// Bounded-queue capacity must be at least 1.
    #[error("invalid capacity: bounded queues require capacity of at least 1")]
    InvalidCapacity,

    /// Timer configuration errors (granularity/spin-limit relationship).
    #[error("invalid timer configuration: {0}")]
    InvalidTimer(String),
}

/// Convenience type alias for Results using SchedulerError.
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;
