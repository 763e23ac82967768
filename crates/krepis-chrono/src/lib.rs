//! Krepis Chrono - Deterministic Virtual-Time Scheduler
//!
//! # Overview
//!
//! `krepis-chrono` lets test code simulate the passage of time and the
//! execution of deferred work (timers, posted callbacks, run-when-idle
//! semantics) without real wall-clock delays, while reproducing the
//! interleavings between a *home* context (a simulated UI thread) and the
//! worker contexts that post work into it.
//!
//! # Trinity Architecture
//!
//! - **Domain**: clock, tasks, contexts and the scheduler itself
//! - **Infrastructure**: OS-thread context registry
//! - **Adapters**: ready-made task listeners
//!
//! # Laws
//!
//! ## Temporal Laws
//! - Time never decreases, not even across `reset`
//! - Tasks run by `(scheduled time, post order)`
//! - Time deltas are compared at full `i64` width
//!
//! ## Liveness Laws
//! - `Paused`: nothing runs unless the caller advances or runs tasks
//! - `Unpaused`: zero-delay work posted from home runs on the spot
//! - `ConstantIdle`: all posted work runs on the spot, moving the clock
//!
//! ## Failure Laws
//! - A failing task surfaces as [`SchedulerError::TaskFailed`] after it has
//!   left the queue; later calls keep draining
//!
//! # Usage
//!
//! ```rust
//! use krepis_chrono::{Runnable, Scheduler, TimeUnit};
//! use parking_lot::Mutex;
//! use std::sync::Arc;
//!
//! let scheduler = Scheduler::new();
//! let log = Arc::new(Mutex::new(Vec::new()));
//! scheduler.pause();
//!
//! for (name, delay) in [("one", 0), ("two", 0), ("three", 1_000)] {
//!     let log = Arc::clone(&log);
//!     let work = Runnable::from_fn(move || log.lock().push(name));
//!     scheduler.post_delayed(work, delay, TimeUnit::Nanoseconds).unwrap();
//! }
//!
//! scheduler.unpause().unwrap();
//! assert_eq!(*log.lock(), vec!["one", "two"]);
//!
//! scheduler.advance_by(1_000, TimeUnit::Nanoseconds).unwrap();
//! assert_eq!(*log.lock(), vec!["one", "two", "three"]);
//! ```
//!
//! # Logging
//!
//! The crate emits [`tracing`] events (`trace` for queue traffic, `debug` for
//! state changes, `warn` for failing tasks) and never installs a subscriber.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

// Trinity Architecture Layers
pub mod adapters;
pub mod domain;
pub mod infrastructure;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Re-export Primary Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// Clock types
pub use domain::{IdleState, TimeUnit, VirtualClock, VirtualTimeNs, DEFAULT_START_TIME_NS};

// Task types
pub use domain::{Runnable, Task, TaskError, TaskListener, TaskResult};

// Context types
pub use domain::{ContextId, ContextProvider, ManualContext};
pub use infrastructure::ThreadContext;

// Scheduler types
pub use domain::{Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerError, SchedulerResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_defined() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_primary_types_exported() {
        let _state = IdleState::default();
        let _unit = TimeUnit::Milliseconds;
        let _ctx = ContextId::new(0);
        let _work = Runnable::from_fn(|| {});
        let _config = SchedulerConfig::default();
    }

    #[test]
    fn test_scheduler_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<Scheduler>();
        assert_send_sync::<Scheduler<std::sync::Arc<ManualContext>>>();
        assert_send_sync::<SchedulerError>();
    }
}
