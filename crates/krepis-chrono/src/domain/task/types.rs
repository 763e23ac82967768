//! Task Types
//!
//! A [`Task`] is an immutable record of deferred work, the virtual time it
//! becomes eligible and the insertion sequence used to break ties.

use crate::domain::clock::VirtualTimeNs;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Failure returned by a unit of work
pub type TaskError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of running a unit of work
pub type TaskResult = Result<(), TaskError>;

type Work = dyn Fn() -> TaskResult + Send + Sync + 'static;

/// Shared handle to a unit of deferred work
///
/// Cloning is cheap and keeps identity: two clones of one `Runnable` are
/// the *same* work as far as [`Runnable::ptr_eq`] (and therefore
/// `Scheduler::remove`) is concerned, while two separately constructed
/// runnables never are, even when built from identical closures.
///
/// # Example
///
/// ```rust
/// use krepis_chrono::Runnable;
///
/// let a = Runnable::from_fn(|| {});
/// let b = a.clone();
/// let c = Runnable::from_fn(|| {});
///
/// assert!(a.ptr_eq(&b));
/// assert!(!a.ptr_eq(&c));
/// ```
#[derive(Clone)]
pub struct Runnable {
    work: Arc<Work>,
}

impl Runnable {
    /// Wrap fallible work
    pub fn new<F>(work: F) -> Self
    where
        F: Fn() -> TaskResult + Send + Sync + 'static,
    {
        Self {
            work: Arc::new(work),
        }
    }

    /// Wrap infallible work
    pub fn from_fn<F>(work: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::new(move || {
            work();
            Ok(())
        })
    }

    /// Execute the work on the calling thread
    #[inline]
    pub fn run(&self) -> TaskResult {
        (self.work)()
    }

    /// Reference identity, never structural equality
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.work, &other.work)
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.work).cast::<()>()
    }
}

impl fmt::Debug for Runnable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Runnable").field(&self.addr()).finish()
    }
}

/// Work scheduled at a virtual instant
///
/// # Ordering
///
/// Tasks are ordered by `(scheduled_at_ns, sequence)`. The [`Ord`] impl is
/// *reversed* so that `std::collections::BinaryHeap` (a max-heap) pops the
/// earliest task first:
///
/// ```text
/// a > b  ⇔  a.scheduled_at_ns < b.scheduled_at_ns
///        ∨ (a.scheduled_at_ns = b.scheduled_at_ns ∧ a.sequence < b.sequence)
/// ```
///
/// Both keys are compared with full-width `i64` comparison.
#[derive(Debug, Clone)]
pub struct Task {
    /// The deferred work
    pub work: Runnable,

    /// When this task becomes eligible to run
    pub scheduled_at_ns: VirtualTimeNs,

    /// Insertion sequence, tie-breaker for equal times
    pub sequence: i64,
}

impl Task {
    /// Create a new task
    pub fn new(work: Runnable, scheduled_at_ns: VirtualTimeNs, sequence: i64) -> Self {
        Self {
            work,
            scheduled_at_ns,
            sequence,
        }
    }

    /// Check if this task is due at `now_ns`
    #[inline]
    pub fn is_due(&self, now_ns: VirtualTimeNs) -> bool {
        self.scheduled_at_ns <= now_ns
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.scheduled_at_ns == other.scheduled_at_ns && self.sequence == other.sequence
    }
}

impl Eq for Task {}

impl PartialOrd for Task {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Task {
    fn cmp(&self, other: &Self) -> Ordering {
        // Earlier time is greater (min-heap on top of BinaryHeap)
        match other.scheduled_at_ns.cmp(&self.scheduled_at_ns) {
            Ordering::Equal => other.sequence.cmp(&self.sequence),
            ord => ord,
        }
    }
}
