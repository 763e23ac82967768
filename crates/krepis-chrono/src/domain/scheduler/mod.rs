//! Scheduler Module
//!
//! # Module Structure
//!
//! ```text
//! domain/scheduler/
//! ├── types.rs      SchedulerError, SchedulerConfig
//! ├── engine.rs     Scheduler: posting, idle state, advancing, running
//! └── mod.rs        SchedulerBuilder
//! ```
//!
//! # Laws Enforced
//!
//! - Ordering: tasks run by `(scheduled_at_ns, sequence)`, FIFO among equal
//!   times, with full-width `i64` comparison
//! - Monotonicity: the clock never moves backward, across `reset` included
//! - Failure isolation: a failing task is already off the queue when its
//!   error surfaces; the next call keeps draining

mod engine;
mod types;

pub use engine::Scheduler;
pub use types::{SchedulerConfig, SchedulerError, SchedulerResult};

use crate::domain::clock::{IdleState, VirtualTimeNs};
use crate::domain::context::{ContextId, ContextProvider};
use crate::infrastructure::ThreadContext;
use std::time::Duration;

/// Builder for [`Scheduler`]
///
/// # Example
///
/// ```rust
/// use krepis_chrono::{ContextId, IdleState, ManualContext, SchedulerBuilder};
/// use std::sync::Arc;
///
/// let ctx = Arc::new(ManualContext::new(ContextId::new(1)));
/// let scheduler = SchedulerBuilder::new()
///     .start_time_ns(0)
///     .idle_state(IdleState::Paused)
///     .context_provider(Arc::clone(&ctx))
///     .build();
///
/// assert_eq!(scheduler.current_time(), 0);
/// assert!(scheduler.is_paused());
/// assert_eq!(scheduler.home_context(), ContextId::new(1));
/// ```
#[derive(Debug)]
pub struct SchedulerBuilder<C: ContextProvider = ThreadContext> {
    config: SchedulerConfig,
    home: Option<ContextId>,
    contexts: C,
}

impl SchedulerBuilder<ThreadContext> {
    /// Create new builder with default configuration
    ///
    /// Defaults:
    /// - Clock starts at 100 ms
    /// - Blocking operations wait 1 s
    /// - `Unpaused`
    /// - Contexts are OS threads; home is the thread calling `build`
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
            home: None,
            contexts: ThreadContext::new(),
        }
    }
}

impl Default for SchedulerBuilder<ThreadContext> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ContextProvider> SchedulerBuilder<C> {
    /// Replace the whole configuration
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the initial clock value
    #[must_use]
    pub fn start_time_ns(mut self, start_time_ns: VirtualTimeNs) -> Self {
        self.config.start_time_ns = start_time_ns;
        self
    }

    /// Set how long blocking operations wait without an explicit timeout
    #[must_use]
    pub fn default_wait(mut self, default_wait: Duration) -> Self {
        self.config.default_wait = default_wait;
        self
    }

    /// Set the initial idle state
    #[must_use]
    pub fn idle_state(mut self, state: IdleState) -> Self {
        self.config.initial_idle_state = state;
        self
    }

    /// Set the home context explicitly instead of using the caller of `build`
    #[must_use]
    pub fn home_context(mut self, home: ContextId) -> Self {
        self.home = Some(home);
        self
    }

    /// Use another source of context ids
    #[must_use]
    pub fn context_provider<D: ContextProvider>(self, contexts: D) -> SchedulerBuilder<D> {
        SchedulerBuilder {
            config: self.config,
            home: self.home,
            contexts,
        }
    }

    /// Build the scheduler
    pub fn build(self) -> Scheduler<C> {
        let home = self.home.unwrap_or_else(|| self.contexts.current());
        Scheduler::with_context(self.config, self.contexts, home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::context::ManualContext;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_builder_defaults() {
        let scheduler = SchedulerBuilder::new().build();

        assert_eq!(scheduler.config(), &SchedulerConfig::default());
        assert_eq!(scheduler.current_time(), 100_000_000);
        assert!(scheduler.is_home_context());
    }

    #[test]
    fn test_builder_home_is_building_thread() {
        let scheduler = Arc::new(Scheduler::builder().build());

        let remote = Arc::clone(&scheduler);
        let worker_is_home = thread::spawn(move || remote.is_home_context())
            .join()
            .unwrap();

        assert!(!worker_is_home);
        assert!(scheduler.is_home_context());
    }

    #[test]
    fn test_builder_explicit_home() {
        let ctx = Arc::new(ManualContext::new(ContextId::new(5)));
        let scheduler = SchedulerBuilder::new()
            .context_provider(Arc::clone(&ctx))
            .home_context(ContextId::new(2))
            .default_wait(Duration::from_millis(10))
            .build();

        assert_eq!(scheduler.home_context(), ContextId::new(2));
        assert!(!scheduler.is_home_context());

        ctx.enter(ContextId::new(2));
        assert!(scheduler.is_home_context());
        assert_eq!(scheduler.config().default_wait, Duration::from_millis(10));
    }
}
