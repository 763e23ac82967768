//! Ready-made Task Listeners
//!
//! Outbound adapters from queue insertions to logging and test
//! instrumentation. Register with `Scheduler::add_task_listener`.

use crate::domain::task::{Task, TaskListener};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Emits a `debug` event for every queued task
#[derive(Debug, Clone)]
pub struct TracingListener {
    label: &'static str,
}

impl TracingListener {
    /// Tag every event with `label` (useful with several schedulers)
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl Default for TracingListener {
    fn default() -> Self {
        Self::new("scheduler")
    }
}

impl TaskListener for TracingListener {
    fn on_task_added(&self, task: &Task) {
        debug!(
            scheduler = self.label,
            at_ns = task.scheduled_at_ns,
            sequence = task.sequence,
            work = ?task.work,
            "task added"
        );
    }
}

/// Counts queued tasks
///
/// Clones share the counter, so keep one and hand the other to the
/// scheduler.
///
/// ```rust
/// use krepis_chrono::adapters::CountingListener;
/// use krepis_chrono::{Runnable, Scheduler, TimeUnit};
///
/// let scheduler = Scheduler::new();
/// let counter = CountingListener::new();
/// scheduler.add_task_listener(counter.clone());
///
/// scheduler.post_delayed(Runnable::from_fn(|| {}), 1, TimeUnit::Seconds).unwrap();
/// assert_eq!(counter.count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CountingListener {
    added: Arc<AtomicUsize>,
}

impl CountingListener {
    /// Create a counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Tasks seen so far
    pub fn count(&self) -> usize {
        self.added.load(Ordering::Acquire)
    }

    /// Reset the count to zero, returning the previous value
    pub fn take(&self) -> usize {
        self.added.swap(0, Ordering::AcqRel)
    }
}

impl TaskListener for CountingListener {
    fn on_task_added(&self, _task: &Task) {
        self.added.fetch_add(1, Ordering::AcqRel);
    }
}
