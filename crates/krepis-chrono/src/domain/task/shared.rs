//! Shared Task Queue - Locked, Waitable, Observable
//!
//! # Thread Safety
//!
//! ```text
//! SharedTaskQueue
//!   ├─ inner:      Mutex<TaskQueue>   every structural change
//!   ├─ task_added: Condvar            wakes blocked `wait_for_task` callers
//!   └─ listeners:  RwLock<Vec<..>>    notified after `inner` is released
//! ```
//!
//! The mutex guards nothing but queue structure and is never held while
//! work executes, so a worker thread can always enqueue while the home
//! thread is running a task or waiting for one.

use super::queue::TaskQueue;
use super::types::{Runnable, Task};
use crate::domain::clock::VirtualTimeNs;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Observer of queue insertions
///
/// Called synchronously on the inserting thread, after the queue lock has
/// been released, so implementations may call back into the scheduler.
///
/// Any `Fn(&Task) + Send + Sync` closure is a listener.
pub trait TaskListener: Send + Sync {
    /// A task was added to the queue
    fn on_task_added(&self, task: &Task);
}

impl<F> TaskListener for F
where
    F: Fn(&Task) + Send + Sync,
{
    fn on_task_added(&self, task: &Task) {
        self(task);
    }
}

/// Thread-safe task queue with blocking waits and insertion listeners
pub struct SharedTaskQueue {
    inner: Mutex<TaskQueue>,
    task_added: Condvar,
    listeners: RwLock<Vec<Arc<dyn TaskListener>>>,
}

impl SharedTaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TaskQueue::new()),
            task_added: Condvar::new(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Register a listener; listeners are notified in registration order
    pub fn add_listener(&self, listener: Arc<dyn TaskListener>) {
        self.listeners.write().push(listener);
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// See [`TaskQueue::insert`]
    pub fn insert(&self, work: Runnable, scheduled_at_ns: VirtualTimeNs) -> Task {
        let task = self.inner.lock().insert(work, scheduled_at_ns);
        self.notify(&task);
        task
    }

    /// See [`TaskQueue::insert_front`]
    pub fn insert_front(&self, work: Runnable, now_ns: VirtualTimeNs) -> Task {
        let task = self.inner.lock().insert_front(work, now_ns);
        self.notify(&task);
        task
    }

    /// See [`TaskQueue::pop_earliest`]
    pub fn pop_earliest(&self) -> Option<Task> {
        self.inner.lock().pop_earliest()
    }

    /// See [`TaskQueue::pop_due`]
    pub fn pop_due(&self, until_ns: VirtualTimeNs) -> Option<Task> {
        self.inner.lock().pop_due(until_ns)
    }

    /// See [`TaskQueue::earliest_time`]
    pub fn earliest_time(&self) -> Option<VirtualTimeNs> {
        self.inner.lock().earliest_time()
    }

    /// See [`TaskQueue::latest_time`]
    pub fn latest_time(&self) -> Option<VirtualTimeNs> {
        self.inner.lock().latest_time()
    }

    /// See [`TaskQueue::remove_all_matching`]
    pub fn remove_all_matching(&self, work: &Runnable) -> usize {
        self.inner.lock().remove_all_matching(work)
    }

    /// Number of queued tasks
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drop every queued task
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Block until the queue holds at least one task or `timeout` elapses
    ///
    /// Returns `true` if a task is available. A zero timeout checks once and
    /// returns immediately.
    pub fn wait_for_task(&self, timeout: Duration) -> bool {
        // Durations too large for `Instant` mean "wait forever"
        let deadline = Instant::now().checked_add(timeout);
        let mut queue = self.inner.lock();

        while queue.is_empty() {
            match deadline {
                Some(deadline) => {
                    if self.task_added.wait_until(&mut queue, deadline).timed_out() {
                        return !queue.is_empty();
                    }
                }
                None => self.task_added.wait(&mut queue),
            }
        }
        true
    }

    fn notify(&self, task: &Task) {
        self.task_added.notify_all();

        // Snapshot so listeners may register further listeners
        let listeners: Vec<_> = self.listeners.read().iter().cloned().collect();
        for listener in listeners {
            listener.on_task_added(task);
        }
    }
}

impl Default for SharedTaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SharedTaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTaskQueue")
            .field("len", &self.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_listeners_notified_in_registration_order() {
        let queue = SharedTaskQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..3 {
            let seen = Arc::clone(&seen);
            queue.add_listener(Arc::new(move |task: &Task| {
                seen.lock().push((id, task.scheduled_at_ns));
            }));
        }

        queue.insert(Runnable::from_fn(|| {}), 10);
        queue.insert_front(Runnable::from_fn(|| {}), 20);

        assert_eq!(
            *seen.lock(),
            vec![(0, 10), (1, 10), (2, 10), (0, 10), (1, 10), (2, 10)]
        );
    }

    #[test]
    fn test_listener_may_reenter_queue() {
        let queue = Arc::new(SharedTaskQueue::new());
        let observed_len = Arc::new(AtomicUsize::new(0));

        let q = Arc::clone(&queue);
        let len = Arc::clone(&observed_len);
        queue.add_listener(Arc::new(move |_: &Task| {
            len.store(q.len(), Ordering::SeqCst);
        }));

        queue.insert(Runnable::from_fn(|| {}), 0);
        queue.insert(Runnable::from_fn(|| {}), 0);
        assert_eq!(observed_len.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_wait_for_task_times_out_when_empty() {
        let queue = SharedTaskQueue::new();
        let start = Instant::now();

        assert!(!queue.wait_for_task(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(!queue.wait_for_task(Duration::ZERO));
    }

    #[test]
    fn test_wait_for_task_wakes_on_cross_thread_insert() {
        let queue = Arc::new(SharedTaskQueue::new());

        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.insert(Runnable::from_fn(|| {}), 0);
            })
        };

        assert!(queue.wait_for_task(Duration::from_secs(5)));
        producer.join().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_wait_for_task_returns_immediately_when_nonempty() {
        let queue = SharedTaskQueue::new();
        queue.insert(Runnable::from_fn(|| {}), 0);
        assert!(queue.wait_for_task(Duration::ZERO));
    }

    #[test]
    fn test_clear_empties_queue() {
        let queue = SharedTaskQueue::new();
        assert!(queue.is_empty());

        queue.insert(Runnable::from_fn(|| {}), 0);
        queue.insert_front(Runnable::from_fn(|| {}), 0);
        assert!(!queue.is_empty());

        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.earliest_time(), None);
    }
}
