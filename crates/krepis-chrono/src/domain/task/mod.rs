//! Task Module
//!
//! Deferred work and the ordered queue that holds it until the scheduler
//! dispatches it.
//!
//! # Ordering
//!
//! ```text
//! (scheduled_at_ns, sequence) ascending
//!
//!   t=100 seq=-1   ◀── post_at_front_of_queue
//!   t=100 seq=0
//!   t=100 seq=3
//!   t=250 seq=1
//!   t=60_000_000_100 seq=2
//! ```

mod queue;
mod shared;
mod types;

pub use queue::TaskQueue;
pub use shared::{SharedTaskQueue, TaskListener};
pub use types::{Runnable, Task, TaskError, TaskResult};
