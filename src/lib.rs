//! # Poisson scheduler
//!
//! A library for firing user-supplied actions at independent, random times
//! whose rates follow per-category Poisson processes, with O(log n)
//! rate-weighted selection among thousands of dynamically-changing
//! categories.
//!
//! The building blocks, bottom up:
//!
//! - [`RateTree`]: ordered category → rate map augmented with subtree rate
//!   sums, so a uniform draw over `[0, total)` picks a category with
//!   probability proportional to its rate.
//! - [`PreciseTimer`]: drift-corrected cancelable sleep toward an absolute
//!   deadline, with a configurable spin tail for sub-kernel-latency sleeps.
//! - [`Action`]: the trigger vocabulary — synchronous (inline on the firing
//!   worker) or background (dedicated thread). A trigger returning `false`
//!   evicts the category.
//! - [`BoundedQueue`] and [`QueueProcessor`]: capacity-limited work queues
//!   drained by single workers, with requeue-on-failure and zombie
//!   recovery.
//! - [`PoissonScheduler`]: the core — N workers sampling categories and
//!   exponential delays, with live rate changes, a global speed scale, and
//!   automatic eviction of failing actions.
//! - [`PoissonQueue`]: the composite — a scheduler whose per-category
//!   drain actions feed bounded processors from one shared input stream.
//!
//! ## Example
//!
//! ```no_run
//! use poisson_scheduler::{Action, PoissonScheduler};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let fires = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&fires);
//!
//! let scheduler = PoissonScheduler::new(2);
//! scheduler.set_action(
//!     "tick",
//!     Action::sync(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!         true
//!     }),
//!     true,
//! );
//! scheduler.set_rate("tick", 10.0); // ten fires per second on average
//! scheduler.start();
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! scheduler.stop();
//! assert!(fires.load(Ordering::Relaxed) > 0);
//! ```
//!
//! ## Concurrency model
//!
//! Plain OS threads throughout — no async runtime. Every scheduler worker
//! owns a private PRNG and a private timer; shared state sits behind
//! `parking_lot` locks with the discipline that outgoing actions and
//! processors are always destroyed *outside* the lock that guarded them,
//! since their destructors join threads.

pub mod action;
pub mod builder;
pub mod config;
pub mod error;
pub mod poisson_queue;
pub mod processor;
pub mod queue;
pub mod rate_tree;
pub mod scheduler;
pub mod timer;

pub use action::{Action, AsyncAction, SyncAction};
pub use builder::SchedulerBuilder;
pub use config::{SchedulerConfig, TimerConfig};
pub use error::{SchedulerError, SchedulerResult};
pub use poisson_queue::PoissonQueue;
pub use processor::QueueProcessor;
pub use queue::BoundedQueue;
pub use rate_tree::RateTree;
pub use scheduler::PoissonScheduler;
pub use timer::{PreciseTimer, SleepTimer, TimerFactory};
