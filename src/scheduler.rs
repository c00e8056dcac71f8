//! The Poisson action scheduler.
//!
//! [`PoissonScheduler`] runs N worker threads. Each iteration, a worker
//! draws a category from the rate tree (weighted by its rate) and an
//! exponential delay with rate equal to the tree total, sleeps on its
//! private drift-corrected timer, then triggers the category's action. The
//! union of all categories therefore behaves as independent Poisson
//! processes: category `k` with rate λ fires on average λ times per second,
//! regardless of what else is registered.
//!
//! # Contracts
//!
//! Misuse panics rather than returning errors (see
//! [`crate::error::SchedulerError`] for the validated construction path):
//!
//! - [`PoissonScheduler::start`] on a running scheduler,
//! - [`PoissonScheduler::stop`] from a scheduler-owned thread (an action
//!   that needs to stop the scheduler must be an [`Action::background`] and
//!   use [`PoissonScheduler::async_stop`]),
//! - [`PoissonScheduler::set_timer_factory`] while running,
//! - negative or non-finite rates and scales.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use log::{debug, info};
use parking_lot::{Condvar, Mutex, RwLock};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Exp1;

use crate::action::Action;
use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::rate_tree::RateTree;
use crate::timer::{PreciseTimer, SleepTimer, TimerFactory};

/// Upper bound on a single sampled sleep, in seconds (about 31 years).
const MAX_DELAY_SECS: f64 = 1e9;

/// State shared between the scheduler handle and its workers.
struct Shared<K> {
    stop_requested: AtomicBool,
    stopped: AtomicBool,
    /// Guards the condvar used for empty-tree parking and the
    /// stopping/stopped waits.
    state: Mutex<()>,
    state_signal: Condvar,
    /// Bumped by every rate insertion; lets a parking worker detect a
    /// `set_rate` that landed between its tree read and its wait.
    rate_epoch: AtomicU64,
    rates: RwLock<RateTree<K>>,
    actions: RwLock<BTreeMap<K, Action>>,
    scale: RwLock<f64>,
}

impl<K: Ord + Clone + Debug> Shared<K> {
    fn set_rate(&self, category: K, rate: f64) {
        assert!(
            rate.is_finite() && rate >= 0.0,
            "set_rate with invalid rate {rate}"
        );
        if rate > 0.0 {
            self.rates.write().upsert(category, rate);
            // Commit first, then wake parked workers; the epoch closes the
            // window between a worker's tree read and its wait.
            let _guard = self.state.lock();
            self.rate_epoch.fetch_add(1, Ordering::Release);
            self.state_signal.notify_all();
        } else {
            self.rates.write().erase(&category);
        }
    }

    fn erase_rate(&self, category: &K) {
        self.rates.write().erase(category);
    }

    fn erase_action(&self, category: &K) {
        let removed = self.actions.write().remove(category);
        // Dropping outside the lock: an async action's drop joins its
        // worker thread.
        drop(removed);
    }
}

/// Worker loop: select a category, sleep the sampled delay, fire.
fn worker_loop<K: Ord + Clone + Debug>(
    shared: Arc<Shared<K>>,
    mut timer: Box<dyn SleepTimer>,
    mut rng: ChaCha8Rng,
    thread_count: usize,
) {
    let cancel = |shared: &Shared<K>| shared.stop_requested.load(Ordering::Acquire);
    timer.mark();

    while !shared.stop_requested.load(Ordering::Acquire) {
        let scale = *shared.scale.read();
        // Draw both variates up front so the tree lock is held only for
        // the lookup itself.
        let category_point: f64 = rng.gen();
        let interval: f64 = rng.sample(Exp1);
        let interval = interval / scale;

        // Category selection comes before the sleep: the sleep belongs to
        // the set of categories present when it starts, and rate changes
        // take effect on the next iteration. The action is looked up only
        // *after* the sleep, so it may have been replaced or removed by
        // then; both are allowed.
        let (category, delay) = {
            let rates = shared.rates.read();
            let total = rates.total();
            if total == 0.0 {
                let epoch = shared.rate_epoch.load(Ordering::Acquire);
                drop(rates);
                let mut guard = shared.state.lock();
                if shared.stop_requested.load(Ordering::Acquire) {
                    break;
                }
                if shared.rate_epoch.load(Ordering::Acquire) == epoch {
                    debug!("worker parking on an empty rate tree");
                    shared.state_signal.wait(&mut guard);
                }
                drop(guard);
                // Don't let the timer treat the park as oversleep to be
                // corrected for.
                timer.mark();
                continue;
            }
            // With N workers each stretching its sleeps by N, the merged
            // point process keeps the aggregate rate `total`.
            let category = rates.locate(category_point * total).clone();
            // Capped so vanishingly small totals keep Duration and Instant
            // arithmetic in range; stop requests still land within one
            // cancel granularity.
            let delay = (interval / total * thread_count as f64).min(MAX_DELAY_SECS);
            (category, delay)
        };

        let cancel_fn = || cancel(&shared);
        timer.sleep_for(Duration::from_secs_f64(delay), Some(&cancel_fn));
        if shared.stop_requested.load(Ordering::Acquire) {
            break;
        }

        let keep = {
            let actions = shared.actions.read();
            match actions.get(&category) {
                Some(action) => action.trigger(),
                None => true,
            }
        };
        if !keep {
            // Eviction takes the write locks, so the registry read lock
            // must be gone by now.
            debug!("evicting category {category:?} after failed trigger");
            shared.erase_rate(&category);
            shared.erase_action(&category);
        }
    }
}

/// A multi-threaded Poisson-process action scheduler, generic over the
/// category key.
///
/// All methods take `&self`; wrap the scheduler in an [`Arc`] to share it
/// with actions that need to stop it or change rates from inside a fire.
///
/// ```no_run
/// use poisson_scheduler::{Action, PoissonScheduler};
///
/// let scheduler = PoissonScheduler::with_seed(2, 42);
/// scheduler.set_action("heartbeat", Action::sync(|| { println!("beat"); true }), true);
/// scheduler.set_rate("heartbeat", 4.0); // four beats per second on average
/// scheduler.start();
/// std::thread::sleep(std::time::Duration::from_secs(1));
/// scheduler.stop();
/// ```
pub struct PoissonScheduler<K> {
    thread_count: usize,
    seed: u64,
    timer_factory: Mutex<TimerFactory>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    shared: Arc<Shared<K>>,
}

impl<K: Ord + Clone + Send + Sync + Debug + 'static> PoissonScheduler<K> {
    /// Create a stopped scheduler with `threads` workers, seeded from the
    /// wall clock.
    pub fn new(threads: usize) -> Self {
        Self::with_seed(threads, default_seed())
    }

    /// Create a stopped scheduler with a deterministic seed. Worker `i`
    /// derives its private generator from `seed ^ i`.
    pub fn with_seed(threads: usize, seed: u64) -> Self {
        assert!(threads > 0, "scheduler requires at least one worker thread");
        Self {
            thread_count: threads,
            seed,
            timer_factory: Mutex::new(Arc::new(|| {
                Box::new(PreciseTimer::default()) as Box<dyn SleepTimer>
            })),
            workers: Mutex::new(Vec::new()),
            shared: Arc::new(Shared {
                stop_requested: AtomicBool::new(true),
                stopped: AtomicBool::new(true),
                state: Mutex::new(()),
                state_signal: Condvar::new(),
                rate_epoch: AtomicU64::new(0),
                rates: RwLock::new(RateTree::new()),
                actions: RwLock::new(BTreeMap::new()),
                scale: RwLock::new(1.0),
            }),
        }
    }

    /// Validated construction from a [`SchedulerConfig`], applying scale
    /// and per-worker timer settings.
    pub fn from_config(config: &SchedulerConfig) -> SchedulerResult<Self> {
        config.validate()?;
        let scheduler = Self::with_seed(
            config.threads,
            config.seed.unwrap_or_else(default_seed),
        );
        scheduler.set_scale(config.scale);
        let timer = config.timer;
        scheduler.set_timer_factory(Arc::new(move || {
            Box::new(PreciseTimer::from_config(&timer)) as Box<dyn SleepTimer>
        }));
        Ok(scheduler)
    }

    /// Replace the per-worker timer constructor. Panics while running.
    pub fn set_timer_factory(&self, factory: TimerFactory) {
        assert!(
            self.is_stopped(),
            "set_timer_factory on a running scheduler"
        );
        *self.timer_factory.lock() = factory;
    }

    /// Set the firing rate for `category`. A positive rate inserts or
    /// updates the category and wakes parked workers; zero is accepted as
    /// an alias for [`PoissonScheduler::erase_rate`]. Negative or
    /// non-finite rates panic.
    pub fn set_rate(&self, category: K, rate: f64) {
        self.shared.set_rate(category, rate);
    }

    /// Checked variant of [`PoissonScheduler::set_rate`]: refuses
    /// non-positive or non-finite rates instead of panicking (and does not
    /// accept zero as an erase alias).
    pub fn try_set_rate(&self, category: K, rate: f64) -> SchedulerResult<()> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(SchedulerError::InvalidRate(rate));
        }
        self.shared.set_rate(category, rate);
        Ok(())
    }

    /// Remove `category` from scheduling consideration. Its action, if
    /// any, stays registered.
    pub fn erase_rate(&self, category: &K) {
        self.shared.erase_rate(category);
    }

    pub fn rate_exists(&self, category: &K) -> bool {
        self.shared.rates.read().exists(category)
    }

    /// Current rate for `category`, or 0.0 when absent.
    pub fn rate_of(&self, category: &K) -> f64 {
        self.shared.rates.read().rate_of(category)
    }

    /// Sum of all registered rates.
    pub fn total_rate(&self) -> f64 {
        self.shared.rates.read().total()
    }

    /// Install an action for `category`, starting it first. With
    /// `overwrite` false the call is refused when an action is already
    /// registered. Returns whether the action was installed.
    ///
    /// The displaced action (or the refused one) is destroyed only after
    /// the registry lock is released, because destroying an async action
    /// joins its thread.
    pub fn set_action(&self, category: K, mut action: Action, overwrite: bool) -> bool {
        action.start();
        let (installed, discarded) = {
            let mut actions = self.shared.actions.write();
            if !overwrite && actions.contains_key(&category) {
                (false, Some(action))
            } else {
                (true, actions.insert(category, action))
            }
        };
        drop(discarded);
        installed
    }

    /// Remove the action for `category`, destroying it outside the
    /// registry lock.
    pub fn erase_action(&self, category: &K) {
        self.shared.erase_action(category);
    }

    pub fn action_exists(&self, category: &K) -> bool {
        self.shared.actions.read().contains_key(category)
    }

    /// Set the global speed multiplier. Sampled delays are divided by it,
    /// so values above 1 make every category fire faster. Must be positive
    /// and finite.
    pub fn set_scale(&self, scale: f64) {
        assert!(
            scale.is_finite() && scale > 0.0,
            "set_scale with invalid scale {scale}"
        );
        *self.shared.scale.write() = scale;
    }

    pub fn scale(&self) -> f64 {
        *self.shared.scale.read()
    }

    /// Spawn the worker threads. Panics unless currently stopped.
    pub fn start(&self) {
        assert!(self.is_stopped(), "start on a running scheduler");
        let mut workers = self.workers.lock();
        self.shared.stopped.store(false, Ordering::Release);
        self.shared.stop_requested.store(false, Ordering::Release);
        if workers.is_empty() {
            info!("starting {} scheduler worker(s)", self.thread_count);
            let factory = self.timer_factory.lock().clone();
            for index in 0..self.thread_count {
                let shared = Arc::clone(&self.shared);
                let factory = Arc::clone(&factory);
                let seed = self.seed ^ index as u64;
                let thread_count = self.thread_count;
                let handle = thread::Builder::new()
                    .name(format!("poisson-worker-{index}"))
                    .spawn(move || {
                        let timer = factory();
                        let rng = ChaCha8Rng::seed_from_u64(seed);
                        worker_loop(shared, timer, rng, thread_count);
                    })
                    .expect("failed to spawn scheduler worker thread");
                workers.push(handle);
            }
        }
    }

    /// Request a stop without waiting. Safe to call from anywhere,
    /// including an action owned by this scheduler. Threads are only
    /// reclaimed by a later [`PoissonScheduler::stop`] (or drop).
    pub fn async_stop(&self) {
        let _guard = self.shared.state.lock();
        self.shared.stop_requested.store(true, Ordering::Release);
        self.shared.state_signal.notify_all();
    }

    /// Stop all workers and join them.
    ///
    /// Must not be called from a thread owned by this scheduler — a sync
    /// action that wants to stop it must use
    /// [`PoissonScheduler::async_stop`] instead.
    pub fn stop(&self) {
        self.async_stop();
        self.join();
    }

    /// All workers have exited and been joined.
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// A stop has been requested; workers may still be draining.
    pub fn is_stopping(&self) -> bool {
        self.shared.stop_requested.load(Ordering::Acquire)
    }

    /// Block until a stop has been requested.
    pub fn wait_stopping(&self) {
        let mut guard = self.shared.state.lock();
        while !self.shared.stop_requested.load(Ordering::Acquire) {
            self.shared.state_signal.wait(&mut guard);
        }
    }

    /// Block until all workers have been joined. Unlike a bare join, the
    /// scheduler can be started again afterward, and this can be called
    /// from any number of threads.
    pub fn wait_stopped(&self) {
        let mut guard = self.shared.state.lock();
        while !self.shared.stopped.load(Ordering::Acquire) {
            self.shared.state_signal.wait(&mut guard);
        }
    }

    fn join(&self) {
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            assert!(
                thread::current().id() != handle.thread().id(),
                "stop called from a scheduler-owned thread; use async_stop"
            );
            let _ = handle.join();
        }
        // Publish the transition under the state lock so wait_stopped
        // cannot miss it.
        let _guard = self.shared.state.lock();
        self.shared.stopped.store(true, Ordering::Release);
        self.shared.state_signal.notify_all();
        info!("scheduler stopped");
    }
}

impl<K> Drop for PoissonScheduler<K> {
    fn drop(&mut self) {
        // Inline stop(): Drop cannot rely on the K bounds of the impl
        // block above.
        {
            let _guard = self.shared.state.lock();
            self.shared.stop_requested.store(true, Ordering::Release);
            self.shared.state_signal.notify_all();
        }
        let mut workers = self.workers.lock();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        self.shared.stopped.store(true, Ordering::Release);
    }
}

fn default_seed() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() ^ u64::from(elapsed.subsec_nanos()),
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn wait_for(predicate: impl Fn() -> bool, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if predicate() {
                return true;
            }
            thread::sleep(Duration::from_millis(1));
        }
        predicate()
    }

    fn counting_action(count: &Arc<AtomicUsize>) -> Action {
        let counter = Arc::clone(count);
        Action::sync(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        })
    }

    #[test]
    fn constructed_stopped() {
        let scheduler: PoissonScheduler<&str> = PoissonScheduler::with_seed(1, 1);
        assert!(scheduler.is_stopped());
        assert!(scheduler.is_stopping());
        assert_eq!(scheduler.total_rate(), 0.0);
        assert_eq!(scheduler.scale(), 1.0);
    }

    #[test]
    fn rate_bookkeeping() {
        let scheduler: PoissonScheduler<&str> = PoissonScheduler::with_seed(1, 1);
        scheduler.set_rate("a", 2.0);
        scheduler.set_rate("b", 3.0);
        assert!(scheduler.rate_exists(&"a"));
        assert_eq!(scheduler.rate_of(&"a"), 2.0);
        assert_eq!(scheduler.total_rate(), 5.0);

        // Zero is an erase alias.
        scheduler.set_rate("a", 0.0);
        assert!(!scheduler.rate_exists(&"a"));
        assert_eq!(scheduler.total_rate(), 3.0);

        scheduler.erase_rate(&"b");
        assert_eq!(scheduler.total_rate(), 0.0);
    }

    #[test]
    fn try_set_rate_refuses_bad_rates() {
        let scheduler: PoissonScheduler<&str> = PoissonScheduler::with_seed(1, 1);
        assert!(scheduler.try_set_rate("a", 1.5).is_ok());
        assert!(matches!(
            scheduler.try_set_rate("a", 0.0),
            Err(SchedulerError::InvalidRate(_))
        ));
        assert!(scheduler.try_set_rate("a", f64::NAN).is_err());
        // The earlier valid rate is untouched by the refusals.
        assert_eq!(scheduler.rate_of(&"a"), 1.5);
    }

    #[test]
    #[should_panic]
    fn negative_rate_panics() {
        let scheduler: PoissonScheduler<&str> = PoissonScheduler::with_seed(1, 1);
        scheduler.set_rate("a", -1.0);
    }

    #[test]
    fn action_bookkeeping() {
        let scheduler: PoissonScheduler<&str> = PoissonScheduler::with_seed(1, 1);
        assert!(!scheduler.action_exists(&"a"));
        assert!(scheduler.set_action("a", Action::sync(|| true), true));
        assert!(scheduler.action_exists(&"a"));

        // Refused without overwrite.
        assert!(!scheduler.set_action("a", Action::sync(|| false), false));
        assert!(scheduler.trigger_for_test(&"a"));

        // Replaced with overwrite.
        assert!(scheduler.set_action("a", Action::sync(|| false), true));
        assert!(!scheduler.trigger_for_test(&"a"));

        scheduler.erase_action(&"a");
        assert!(!scheduler.action_exists(&"a"));
    }

    #[test]
    fn fires_a_single_category() {
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = PoissonScheduler::with_seed(1, 7);
        scheduler.set_action("a", counting_action(&count), true);
        scheduler.set_rate("a", 200.0);
        scheduler.start();
        assert!(wait_for(
            || count.load(Ordering::SeqCst) >= 10,
            Duration::from_secs(5)
        ));
        scheduler.stop();
        assert!(scheduler.is_stopped());
    }

    #[test]
    fn restart_after_stop() {
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = PoissonScheduler::with_seed(2, 11);
        scheduler.set_action("a", counting_action(&count), true);
        scheduler.set_rate("a", 500.0);

        scheduler.start();
        assert!(wait_for(
            || count.load(Ordering::SeqCst) >= 5,
            Duration::from_secs(5)
        ));
        scheduler.stop();

        let before = count.load(Ordering::SeqCst);
        scheduler.start();
        assert!(wait_for(
            || count.load(Ordering::SeqCst) >= before + 5,
            Duration::from_secs(5)
        ));
        scheduler.stop();
    }

    #[test]
    fn eviction_on_failed_trigger() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let scheduler = PoissonScheduler::with_seed(1, 3);
        scheduler.set_action(
            "doomed",
            Action::sync(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                false
            }),
            true,
        );
        scheduler.set_rate("doomed", 300.0);
        scheduler.start();

        assert!(wait_for(
            || !scheduler.rate_exists(&"doomed"),
            Duration::from_secs(5)
        ));
        assert!(!scheduler.action_exists(&"doomed"));
        scheduler.stop();
        // Exactly one invocation: eviction happened before any re-fire.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn workers_park_on_empty_tree_and_wake_on_set_rate() {
        let count = Arc::new(AtomicUsize::new(0));
        let scheduler = PoissonScheduler::with_seed(1, 5);
        scheduler.set_action("late", counting_action(&count), true);
        scheduler.start();

        // No categories: nothing can fire.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        scheduler.set_rate("late", 500.0);
        assert!(wait_for(
            || count.load(Ordering::SeqCst) >= 1,
            Duration::from_secs(5)
        ));
        scheduler.stop();
    }

    #[test]
    fn async_stop_from_inside_an_action() {
        let scheduler = Arc::new(PoissonScheduler::with_seed(1, 9));
        // Actions hold only non-owning references to their scheduler; an
        // owning handle here would be a reference cycle.
        let handle = Arc::downgrade(&scheduler);
        scheduler.set_action(
            "stopper",
            Action::background(move || {
                if let Some(scheduler) = handle.upgrade() {
                    scheduler.async_stop();
                }
                true
            }),
            true,
        );
        scheduler.set_rate("stopper", 500.0);
        scheduler.start();
        scheduler.wait_stopping();
        scheduler.stop();
        assert!(scheduler.is_stopped());
    }

    #[test]
    fn stop_is_prompt_while_sleeping() {
        let scheduler = PoissonScheduler::with_seed(1, 13);
        scheduler.set_action("slow", Action::sync(|| true), true);
        // Rate so low the sampled delay is effectively an hour.
        scheduler.set_rate("slow", 0.0003);
        scheduler.start();
        thread::sleep(Duration::from_millis(30));
        let begun = Instant::now();
        scheduler.stop();
        // Bounded by the default cancel granularity, with margin.
        assert!(begun.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn concurrent_rate_and_action_churn() {
        let scheduler = Arc::new(PoissonScheduler::with_seed(4, 17));
        for key in 0..16u32 {
            scheduler.set_action(key, Action::sync(|| true), true);
            scheduler.set_rate(key, 50.0);
        }
        scheduler.start();

        let mut mutators = Vec::new();
        for offset in 0..4u32 {
            let scheduler = Arc::clone(&scheduler);
            mutators.push(thread::spawn(move || {
                for round in 0..50u32 {
                    let key = (round * 4 + offset) % 16;
                    scheduler.set_rate(key, (round % 7 + 1) as f64);
                    if round % 3 == 0 {
                        scheduler.erase_rate(&key);
                    }
                    if round % 5 == 0 {
                        scheduler.set_action(key, Action::sync(|| true), true);
                    }
                }
            }));
        }
        for mutator in mutators {
            mutator.join().unwrap();
        }
        // The tree survived the churn with a coherent total.
        let total = scheduler.total_rate();
        assert!(total >= 0.0 && total.is_finite());
        scheduler.stop();
        assert!(scheduler.is_stopped());
    }

    #[test]
    fn wait_stopped_observes_a_stop_from_another_thread() {
        let scheduler = Arc::new(PoissonScheduler::<u32>::with_seed(1, 19));
        scheduler.set_rate(1, 100.0);
        scheduler.set_action(1, Action::sync(|| true), true);
        scheduler.start();

        let waiter = {
            let scheduler = Arc::clone(&scheduler);
            thread::spawn(move || {
                scheduler.wait_stopped();
                scheduler.is_stopped()
            })
        };
        thread::sleep(Duration::from_millis(30));
        scheduler.stop();
        assert!(waiter.join().unwrap());
    }

    #[test]
    #[should_panic]
    fn set_timer_factory_while_running_panics() {
        let scheduler = PoissonScheduler::<u32>::with_seed(1, 1);
        scheduler.start();
        scheduler.set_timer_factory(Arc::new(|| {
            Box::new(PreciseTimer::default()) as Box<dyn SleepTimer>
        }));
    }

    #[test]
    #[should_panic]
    fn invalid_scale_panics() {
        let scheduler = PoissonScheduler::<u32>::with_seed(1, 1);
        scheduler.set_scale(0.0);
    }

    #[test]
    #[should_panic]
    fn double_start_panics() {
        let scheduler = PoissonScheduler::<u32>::with_seed(1, 1);
        scheduler.start();
        scheduler.start();
    }

    #[test]
    fn from_config_applies_settings() {
        let config = SchedulerConfig {
            threads: 2,
            seed: Some(99),
            scale: 2.5,
            ..Default::default()
        };
        let scheduler: PoissonScheduler<u32> =
            PoissonScheduler::from_config(&config).unwrap();
        assert_eq!(scheduler.scale(), 2.5);
        assert!(scheduler.is_stopped());

        let bad = SchedulerConfig {
            threads: 0,
            ..Default::default()
        };
        assert!(PoissonScheduler::<u32>::from_config(&bad).is_err());
    }

    impl<K: Ord + Clone + Send + Sync + Debug + 'static> PoissonScheduler<K> {
        /// Trigger a registered action directly, bypassing the workers.
        fn trigger_for_test(&self, category: &K) -> bool {
            let actions = self.shared.actions.read();
            actions.get(category).map_or(true, |action| action.trigger())
        }
    }
}
