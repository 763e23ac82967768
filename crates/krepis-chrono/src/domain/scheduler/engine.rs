//! Scheduler - Virtual-Time Task Dispatch
//!
//! # Locking
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Scheduler                                                    │
//! │  dispatch: ReentrantMutex<Cell<usize>>                       │
//! │     held while popping, moving the clock and running work;   │
//! │     re-entrant so running work may post/advance/run again;   │
//! │     the cell counts how deeply work is nested                │
//! │                                                              │
//! │  queue: SharedTaskQueue  (Mutex + Condvar)                   │
//! │     never held while work runs; waits happen here, before    │
//! │     `dispatch` is taken                                      │
//! │                                                              │
//! │  clock: VirtualClock     (atomics)                           │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Posting Rules
//!
//! | idle state     | caller | delay | effect                              |
//! |----------------|--------|-------|-------------------------------------|
//! | `ConstantIdle` | any    | any   | clock += delay, run now, drain all  |
//! | `Unpaused`     | home   | 0     | run now, drain due                  |
//! | otherwise      |        |       | queue at now + delay                |
//!
//! Draining after synchronous work only happens at the outermost level;
//! work posted from inside running work recurses into these rules but leaves
//! the rest of the queue to whoever is driving the scheduler.

use super::types::{SchedulerConfig, SchedulerError, SchedulerResult};
use crate::domain::clock::{IdleState, TimeUnit, VirtualClock, VirtualTimeNs};
use crate::domain::context::{ContextId, ContextProvider};
use crate::domain::task::{Runnable, SharedTaskQueue, Task, TaskListener};
use crate::infrastructure::ThreadContext;
use parking_lot::ReentrantMutex;
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Deterministic virtual-time scheduler
///
/// Shared between contexts as `Arc<Scheduler>`. Every operation takes
/// `&self`.
///
/// # Example
///
/// ```rust
/// use krepis_chrono::{Runnable, Scheduler, TimeUnit};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let scheduler = Scheduler::new();
/// let runs = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&runs);
/// scheduler
///     .post_delayed(
///         Runnable::from_fn(move || { counter.fetch_add(1, Ordering::SeqCst); }),
///         5,
///         TimeUnit::Seconds,
///     )
///     .unwrap();
///
/// assert_eq!(scheduler.size(), 1);
/// assert!(scheduler.advance_by(5, TimeUnit::Seconds).unwrap());
/// assert_eq!(runs.load(Ordering::SeqCst), 1);
/// assert_eq!(scheduler.current_time_in(TimeUnit::Milliseconds), 5_100);
/// ```
pub struct Scheduler<C: ContextProvider = ThreadContext> {
    clock: VirtualClock,
    queue: SharedTaskQueue,
    dispatch: ReentrantMutex<Cell<usize>>,
    contexts: C,
    home: ContextId,
    config: SchedulerConfig,
}

/// Decrements the nesting counter when work finishes, even by unwinding
struct Nesting<'a>(&'a Cell<usize>);

impl<'a> Nesting<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for Nesting<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl Scheduler<ThreadContext> {
    /// Create a scheduler owned by the calling thread, with default config
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a scheduler owned by the calling thread
    pub fn with_config(config: SchedulerConfig) -> Self {
        let contexts = ThreadContext::new();
        let home = contexts.current();
        Self::with_context(config, contexts, home)
    }

    /// Start building a scheduler
    pub fn builder() -> super::SchedulerBuilder {
        super::SchedulerBuilder::new()
    }
}

impl Default for Scheduler<ThreadContext> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ContextProvider> Scheduler<C> {
    /// Create a scheduler whose home is `home` as reported by `contexts`
    pub fn with_context(config: SchedulerConfig, contexts: C, home: ContextId) -> Self {
        debug!(
            start_ns = config.start_time_ns,
            idle_state = %config.initial_idle_state,
            home = %home,
            "scheduler created"
        );

        Self {
            clock: VirtualClock::new(config.start_time_ns, config.initial_idle_state),
            queue: SharedTaskQueue::new(),
            dispatch: ReentrantMutex::new(Cell::new(0)),
            contexts,
            home,
            config,
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Posting
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Post work with no delay
    pub fn post(&self, work: Runnable) -> SchedulerResult<()> {
        self.post_delayed(work, 0, TimeUnit::Nanoseconds)
    }

    /// Post work to run `delay` units after the current time
    ///
    /// Negative delays are treated as zero. Errors only come from work that
    /// ran synchronously as part of this call.
    pub fn post_delayed(&self, work: Runnable, delay: i64, unit: TimeUnit) -> SchedulerResult<()> {
        let delay_ns = unit.to_nanos(delay).max(0);

        match self.idle_state() {
            IdleState::ConstantIdle => {
                let _dispatch = self.dispatch.lock();
                let at_ns = self.clock.advance_by(delay_ns);
                self.run_now(&work, at_ns)
            }
            IdleState::Unpaused if delay_ns == 0 && self.is_home_context() => {
                let _dispatch = self.dispatch.lock();
                self.run_now(&work, self.current_time())
            }
            _ => {
                let at_ns = self.current_time().saturating_add(delay_ns);
                let task = self.queue.insert(work, at_ns);
                trace!(at_ns, sequence = task.sequence, "task queued");
                Ok(())
            }
        }
    }

    /// Post work to run after a real-time-style `Duration` of virtual time
    pub fn post_after(&self, work: Runnable, delay: Duration) -> SchedulerResult<()> {
        let delay_ns = i64::try_from(delay.as_nanos()).unwrap_or(i64::MAX);
        self.post_delayed(work, delay_ns, TimeUnit::Nanoseconds)
    }

    /// Post work ahead of everything already queued
    ///
    /// Runs immediately when called from the home context while not paused.
    pub fn post_at_front_of_queue(&self, work: Runnable) -> SchedulerResult<()> {
        if !self.is_paused() && self.is_home_context() {
            let _dispatch = self.dispatch.lock();
            return self.run_now(&work, self.current_time());
        }

        let task = self.queue.insert_front(work, self.current_time());
        trace!(
            at_ns = task.scheduled_at_ns,
            sequence = task.sequence,
            "task queued at front"
        );
        Ok(())
    }

    /// Remove every queued occurrence of `work` (by identity)
    ///
    /// Returns the number of tasks removed; unknown work removes nothing.
    pub fn remove(&self, work: &Runnable) -> usize {
        let removed = self.queue.remove_all_matching(work);
        debug!(removed, ?work, "removed queued work");
        removed
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Idle state
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Stop running posted work until told otherwise
    pub fn pause(&self) {
        self.transition(IdleState::Paused);
    }

    /// Resume, then run every task due at the current time
    pub fn unpause(&self) -> SchedulerResult<()> {
        self.transition(IdleState::Unpaused);

        let _dispatch = self.dispatch.lock();
        let ran = self.drain_due(self.current_time())?;
        debug!(ran, "drained due tasks after unpause");
        Ok(())
    }

    /// Switch liveness mode
    ///
    /// Entering `ConstantIdle` runs the whole queue, moving the clock to each
    /// task's time. `Unpaused` and `Paused` behave as [`Self::unpause`] and
    /// [`Self::pause`].
    pub fn set_idle_state(&self, state: IdleState) -> SchedulerResult<()> {
        match state {
            IdleState::Paused => {
                self.pause();
                Ok(())
            }
            IdleState::Unpaused => self.unpause(),
            IdleState::ConstantIdle => {
                self.transition(IdleState::ConstantIdle);

                let _dispatch = self.dispatch.lock();
                let ran = self.drain_all()?;
                debug!(ran, now_ns = self.current_time(), "drained queue for constant idle");
                Ok(())
            }
        }
    }

    /// `true` switches to `ConstantIdle`, `false` to `Unpaused`
    #[deprecated(note = "use `set_idle_state` instead")]
    pub fn idle_constantly(&self, enabled: bool) -> SchedulerResult<()> {
        self.set_idle_state(if enabled {
            IdleState::ConstantIdle
        } else {
            IdleState::Unpaused
        })
    }

    /// Current liveness mode (lock-free)
    #[inline]
    pub fn idle_state(&self) -> IdleState {
        self.clock.idle_state()
    }

    /// Check if the scheduler is paused (lock-free)
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.idle_state().is_paused()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Advancing time
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Run every task scheduled at or before `target_ns`, then set the clock
    /// to `target_ns`
    ///
    /// Returns `Ok(false)` without touching anything when `target_ns` is in
    /// the past, otherwise whether any task ran.
    pub fn advance_to(&self, target_ns: VirtualTimeNs) -> SchedulerResult<bool> {
        let _dispatch = self.dispatch.lock();

        let now_ns = self.current_time();
        if target_ns < now_ns {
            trace!(target_ns, now_ns, "ignoring backward advance");
            return Ok(false);
        }

        let ran = self.drain_due(target_ns)?;
        self.clock.advance_to(target_ns);
        Ok(ran > 0)
    }

    /// [`Self::advance_to`] with the target expressed in `unit`
    pub fn advance_to_in(&self, time: i64, unit: TimeUnit) -> SchedulerResult<bool> {
        self.advance_to(unit.to_nanos(time))
    }

    /// Advance the clock by `delta` units, running what becomes due
    pub fn advance_by(&self, delta: i64, unit: TimeUnit) -> SchedulerResult<bool> {
        self.advance_to(self.current_time().saturating_add(unit.to_nanos(delta)))
    }

    /// [`Self::advance_to_next_posted_runnable_within`] with the default wait
    pub fn advance_to_next_posted_runnable(&self) -> SchedulerResult<bool> {
        self.advance_to_next_posted_runnable_within(self.config.default_wait)
    }

    /// Wait up to `timeout` for work, then advance to the earliest queued time
    ///
    /// Returns `Ok(false)` if nothing was posted in time.
    pub fn advance_to_next_posted_runnable_within(
        &self,
        timeout: Duration,
    ) -> SchedulerResult<bool> {
        self.advance_to_posted(timeout, SharedTaskQueue::earliest_time)
    }

    /// [`Self::advance_to_last_posted_runnable_within`] with the default wait
    pub fn advance_to_last_posted_runnable(&self) -> SchedulerResult<bool> {
        self.advance_to_last_posted_runnable_within(self.config.default_wait)
    }

    /// Wait up to `timeout` for work, then advance to the latest queued time,
    /// running everything up to and including it
    pub fn advance_to_last_posted_runnable_within(
        &self,
        timeout: Duration,
    ) -> SchedulerResult<bool> {
        self.advance_to_posted(timeout, SharedTaskQueue::latest_time)
    }

    fn advance_to_posted(
        &self,
        timeout: Duration,
        target: fn(&SharedTaskQueue) -> Option<VirtualTimeNs>,
    ) -> SchedulerResult<bool> {
        if !self.queue.wait_for_task(timeout) {
            trace!(?timeout, "no task posted before timeout");
            return Ok(false);
        }

        let _dispatch = self.dispatch.lock();
        match target(&self.queue) {
            Some(target_ns) => self.advance_to(target_ns.max(self.current_time())),
            // Removed or run by another caller between the wait and the lock
            None => Ok(false),
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Running tasks
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// [`Self::run_one_task_within`] with the default wait
    pub fn run_one_task(&self) -> SchedulerResult<bool> {
        self.run_one_task_within(self.config.default_wait)
    }

    /// Wait up to `timeout` for a task, then run the earliest one
    ///
    /// The clock moves to the task's time if that is later than now.
    /// Returns `Ok(false)` if the wait timed out.
    pub fn run_one_task_within(&self, timeout: Duration) -> SchedulerResult<bool> {
        let deadline = Instant::now().checked_add(timeout);

        loop {
            let remaining =
                deadline.map_or(timeout, |d| d.saturating_duration_since(Instant::now()));
            if !self.queue.wait_for_task(remaining) {
                trace!(?timeout, "no task to run before timeout");
                return Ok(false);
            }

            let _dispatch = self.dispatch.lock();
            if let Some(task) = self.queue.pop_earliest() {
                self.run_task(task)?;
                return Ok(true);
            }
        }
    }

    /// [`Self::run_tasks_within`] with the default wait
    pub fn run_tasks(&self, count: usize) -> SchedulerResult<bool> {
        self.run_tasks_within(count, self.config.default_wait)
    }

    /// Run `count` tasks, waiting up to `timeout` for each
    ///
    /// Stops with `Ok(false)` at the first wait that times out.
    pub fn run_tasks_within(&self, count: usize, timeout: Duration) -> SchedulerResult<bool> {
        for _ in 0..count {
            if !self.run_one_task_within(timeout)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Queries
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// Current virtual time in nanoseconds (lock-free)
    #[inline]
    pub fn current_time(&self) -> VirtualTimeNs {
        self.clock.now_ns()
    }

    /// Current virtual time in `unit`, truncated toward zero
    #[inline]
    pub fn current_time_in(&self, unit: TimeUnit) -> i64 {
        unit.from_nanos(self.current_time())
    }

    /// Number of queued tasks
    pub fn size(&self) -> usize {
        self.queue.len()
    }

    /// Check if a queued task is due at the current time
    pub fn are_any_runnable(&self) -> bool {
        self.queue
            .earliest_time()
            .is_some_and(|at_ns| at_ns <= self.current_time())
    }

    /// Drop all queued work and return to `Unpaused`; the clock is untouched
    pub fn reset(&self) {
        let _dispatch = self.dispatch.lock();
        let dropped = self.queue.len();
        self.queue.clear();
        self.clock.swap_idle_state(IdleState::Unpaused);
        debug!(dropped, now_ns = self.current_time(), "scheduler reset");
    }

    /// Observe every task added to the queue
    pub fn add_task_listener<L>(&self, listener: L)
    where
        L: TaskListener + 'static,
    {
        self.queue.add_listener(Arc::new(listener));
    }

    /// Context that owns this scheduler
    #[inline]
    pub const fn home_context(&self) -> ContextId {
        self.home
    }

    /// Check if the caller is in the home context
    #[inline]
    pub fn is_home_context(&self) -> bool {
        self.contexts.current() == self.home
    }

    /// Configuration this scheduler was built with
    #[inline]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // Dispatch (callers hold `dispatch`)
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    fn transition(&self, state: IdleState) {
        let previous = self.clock.swap_idle_state(state);
        if previous != state {
            debug!(from = %previous, to = %state, "idle state changed");
        }
    }

    /// Run work synchronously, then drain according to the idle state unless
    /// this is nested inside other work
    fn run_now(&self, work: &Runnable, at_ns: VirtualTimeNs) -> SchedulerResult<()> {
        self.execute(work, at_ns)?;

        if self.dispatch.lock().get() > 0 {
            return Ok(());
        }

        match self.idle_state() {
            IdleState::Paused => {}
            IdleState::Unpaused => {
                self.drain_due(self.current_time())?;
            }
            IdleState::ConstantIdle => {
                self.drain_all()?;
            }
        }
        Ok(())
    }

    /// Pop and run tasks due at `until_ns`, in order
    fn drain_due(&self, until_ns: VirtualTimeNs) -> SchedulerResult<usize> {
        let mut ran = 0;
        while let Some(task) = self.queue.pop_due(until_ns) {
            self.run_task(task)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Pop and run tasks until the queue is empty
    fn drain_all(&self) -> SchedulerResult<usize> {
        let mut ran = 0;
        while let Some(task) = self.queue.pop_earliest() {
            self.run_task(task)?;
            ran += 1;
        }
        Ok(ran)
    }

    fn run_task(&self, task: Task) -> SchedulerResult<()> {
        trace!(at_ns = task.scheduled_at_ns, sequence = task.sequence, "task dequeued");
        self.clock.advance_to(task.scheduled_at_ns);
        self.execute(&task.work, task.scheduled_at_ns)
    }

    fn execute(&self, work: &Runnable, scheduled_at_ns: VirtualTimeNs) -> SchedulerResult<()> {
        let depth = self.dispatch.lock();
        let _nesting = Nesting::enter(&depth);

        work.run().map_err(|source| {
            warn!(
                scheduled_at_ns,
                now_ns = self.current_time(),
                error = %source,
                "task failed"
            );
            SchedulerError::TaskFailed {
                scheduled_at_ns,
                source,
            }
        })
    }
}

impl<C: ContextProvider> fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("now_ns", &self.current_time())
            .field("idle_state", &self.idle_state())
            .field("queued", &self.size())
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}
