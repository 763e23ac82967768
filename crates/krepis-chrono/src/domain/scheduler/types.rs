//! Scheduler Types
//!
//! Error and configuration types shared by the scheduler and its builder.

use crate::domain::clock::{IdleState, VirtualTimeNs, DEFAULT_START_TIME_NS};
use crate::domain::task::TaskError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Scheduler operation errors
///
/// Wait timeouts and backward advances are not errors; those operations
/// report them as `Ok(false)`.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchedulerError {
    /// Work returned an error while being dispatched
    ///
    /// The task had already been removed from the queue; the scheduler is
    /// consistent and may keep being driven.
    #[error("task scheduled at {scheduled_at_ns}ns failed: {source}")]
    TaskFailed {
        /// Scheduled time of the failing task
        scheduled_at_ns: VirtualTimeNs,
        /// Error returned by the work
        #[source]
        source: TaskError,
    },
}

impl SchedulerError {
    /// Scheduled time of the task that caused the error
    pub const fn scheduled_at_ns(&self) -> VirtualTimeNs {
        match self {
            Self::TaskFailed {
                scheduled_at_ns, ..
            } => *scheduled_at_ns,
        }
    }
}

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Scheduler configuration
///
/// Every field is optional when deserializing, so a harness config file
/// only needs to name what it changes:
///
/// ```rust
/// use krepis_chrono::{IdleState, SchedulerConfig};
///
/// let config: SchedulerConfig =
///     serde_json::from_str(r#"{ "initial_idle_state": "paused" }"#).unwrap();
///
/// assert_eq!(config.initial_idle_state, IdleState::Paused);
/// assert_eq!(config.start_time_ns, 100_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Clock value at construction
    pub start_time_ns: VirtualTimeNs,

    /// Real time blocking operations wait for work when called without an
    /// explicit timeout
    pub default_wait: Duration,

    /// Idle state at construction and the state `reset` does *not* restore
    /// (reset always returns to `Unpaused`)
    pub initial_idle_state: IdleState,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            start_time_ns: DEFAULT_START_TIME_NS,
            default_wait: Duration::from_secs(1),
            initial_idle_state: IdleState::Unpaused,
        }
    }
}
