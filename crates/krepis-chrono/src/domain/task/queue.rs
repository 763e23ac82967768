//! Task Queue
//!
//! # Design
//! - `BinaryHeap` for O(log n) insertion and extraction
//! - `Task`'s reversed `Ord` turns the max-heap into an earliest-first queue
//! - Two sequence counters: one counting up for normal insertion, one
//!   counting down for front insertion
//!
//! ```text
//!   insert_front ◀── -3 -2 -1 │ 0 1 2 3 ... ──▶ insert
//! ```
//!
//! Every front-inserted task therefore carries a sequence number below every
//! task already queued, and pops ahead of its same-time peers.
//!
//! This type is not synchronized; the scheduler wraps it in
//! [`SharedTaskQueue`](super::SharedTaskQueue).

use super::types::{Runnable, Task};
use crate::domain::clock::VirtualTimeNs;
use std::collections::BinaryHeap;

/// Ordered collection of pending tasks
#[derive(Debug)]
pub struct TaskQueue {
    /// Pending tasks, earliest on top
    heap: BinaryHeap<Task>,

    /// Next sequence for `insert` (counts up from 0)
    next_sequence: i64,

    /// Next sequence for `insert_front` (counts down from -1)
    next_front_sequence: i64,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_sequence: 0,
            next_front_sequence: -1,
        }
    }

    /// Insert work at `scheduled_at_ns`, after every queued task with the same time
    ///
    /// Returns a copy of the created task.
    pub fn insert(&mut self, work: Runnable, scheduled_at_ns: VirtualTimeNs) -> Task {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let task = Task::new(work, scheduled_at_ns, sequence);
        self.heap.push(task.clone());
        task
    }

    /// Insert work ahead of everything queued
    ///
    /// The task is scheduled at `now_ns`, or at the earliest queued time if
    /// that is earlier, and receives a sequence number below every queued
    /// peer, so the next pop returns it.
    pub fn insert_front(&mut self, work: Runnable, now_ns: VirtualTimeNs) -> Task {
        let scheduled_at_ns = self
            .earliest_time()
            .map_or(now_ns, |earliest| earliest.min(now_ns));

        let sequence = self.next_front_sequence;
        self.next_front_sequence -= 1;

        let task = Task::new(work, scheduled_at_ns, sequence);
        self.heap.push(task.clone());
        task
    }

    /// Earliest task, without removing it
    #[inline]
    pub fn peek_earliest(&self) -> Option<&Task> {
        self.heap.peek()
    }

    /// Time of the earliest task
    #[inline]
    pub fn earliest_time(&self) -> Option<VirtualTimeNs> {
        self.heap.peek().map(|task| task.scheduled_at_ns)
    }

    /// Time of the latest task
    ///
    /// O(n): the heap only keeps its minimum at hand.
    pub fn latest_time(&self) -> Option<VirtualTimeNs> {
        self.heap.iter().map(|task| task.scheduled_at_ns).max()
    }

    /// Remove and return the earliest task
    #[inline]
    pub fn pop_earliest(&mut self) -> Option<Task> {
        self.heap.pop()
    }

    /// Remove and return the earliest task if it is due at `until_ns`
    pub fn pop_due(&mut self, until_ns: VirtualTimeNs) -> Option<Task> {
        if self.heap.peek()?.is_due(until_ns) {
            self.heap.pop()
        } else {
            None
        }
    }

    /// Remove every task whose work is `work` itself (pointer identity)
    ///
    /// Returns the number of tasks removed.
    pub fn remove_all_matching(&mut self, work: &Runnable) -> usize {
        let before = self.heap.len();
        self.heap.retain(|task| !task.work.ptr_eq(work));
        before - self.heap.len()
    }

    /// Number of queued tasks
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if the queue is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every queued task
    ///
    /// Sequence counters keep running so tie-breaking stays monotonic across
    /// resets.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, name: &'static str) -> Runnable {
        let log = Arc::clone(log);
        Runnable::from_fn(move || log.lock().push(name))
    }

    fn drain(queue: &mut TaskQueue) {
        while let Some(task) = queue.pop_earliest() {
            task.work.run().unwrap();
        }
    }

    #[test]
    fn test_queue_pops_in_time_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = TaskQueue::new();

        queue.insert(recording(&log, "c"), 300);
        queue.insert(recording(&log, "a"), 100);
        queue.insert(recording(&log, "b"), 200);

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.earliest_time(), Some(100));
        assert_eq!(queue.latest_time(), Some(300));

        drain(&mut queue);
        assert_eq!(*log.lock(), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_is_fifo_for_equal_times() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = TaskQueue::new();

        for name in ["one", "two", "three", "four"] {
            queue.insert(recording(&log, name), 0);
        }

        drain(&mut queue);
        assert_eq!(*log.lock(), vec!["one", "two", "three", "four"]);
    }

    #[test]
    fn test_insert_front_jumps_ahead_of_same_time_peers() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut queue = TaskQueue::new();

        queue.insert(recording(&log, "one"), 100);
        queue.insert(recording(&log, "two"), 100);
        queue.insert_front(recording(&log, "front-1"), 100);
        queue.insert_front(recording(&log, "front-2"), 100);

        drain(&mut queue);
        assert_eq!(*log.lock(), vec!["front-2", "front-1", "one", "two"]);
    }

    #[test]
    fn test_insert_front_uses_earliest_queued_time() {
        let mut queue = TaskQueue::new();
        queue.insert(Runnable::from_fn(|| {}), 50);

        let front = queue.insert_front(Runnable::from_fn(|| {}), 100);
        assert_eq!(front.scheduled_at_ns, 50);
        assert!(queue.peek_earliest().unwrap().work.ptr_eq(&front.work));

        let mut empty = TaskQueue::new();
        assert_eq!(empty.insert_front(Runnable::from_fn(|| {}), 100).scheduled_at_ns, 100);
    }

    #[test]
    fn test_pop_due_respects_bound() {
        let mut queue = TaskQueue::new();
        queue.insert(Runnable::from_fn(|| {}), 100);
        queue.insert(Runnable::from_fn(|| {}), 200);

        assert_eq!(queue.pop_due(99).map(|t| t.scheduled_at_ns), None);
        assert_eq!(queue.pop_due(150).map(|t| t.scheduled_at_ns), Some(100));
        assert_eq!(queue.pop_due(150).map(|t| t.scheduled_at_ns), None);
        assert_eq!(queue.pop_due(200).map(|t| t.scheduled_at_ns), Some(200));
        assert!(queue.pop_due(i64::MAX).is_none());
    }

    #[test]
    fn test_remove_all_matching_uses_identity() {
        let mut queue = TaskQueue::new();
        let shared = Runnable::from_fn(|| {});
        let lookalike = Runnable::from_fn(|| {});

        queue.insert(lookalike.clone(), 0);
        queue.insert(shared.clone(), 0);
        queue.insert(shared.clone(), 10);

        assert_eq!(queue.remove_all_matching(&shared), 2);
        assert_eq!(queue.len(), 1);
        assert!(queue.peek_earliest().unwrap().work.ptr_eq(&lookalike));

        assert_eq!(queue.remove_all_matching(&shared), 0);
    }

    #[test]
    fn test_sequences_survive_clear() {
        let mut queue = TaskQueue::new();
        let first = queue.insert(Runnable::from_fn(|| {}), 0);
        queue.clear();
        let second = queue.insert(Runnable::from_fn(|| {}), 0);

        assert!(second.sequence > first.sequence);
    }
}
