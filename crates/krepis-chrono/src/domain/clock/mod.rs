//! Virtual Clock Module
//!
//! # Design Philosophy
//!
//! The clock is the narrow piece of scheduler state that must stay readable
//! from any thread at any moment:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  Scheduler                                             │
//! │   ├─ dispatch: ReentrantMutex   (task execution)       │
//! │   ├─ queue:    Mutex + Condvar  (pending tasks)        │
//! │   └─ clock:    VirtualClock     (atomics, no lock)  ◀──┼── current_time()
//! └────────────────────────────────────────────────────────┘     idle_state()
//! ```
//!
//! # Laws Enforced
//! - Time monotonicity: the clock never decreases
//! - Full-width ordering: times are `i64` nanoseconds, compared with `Ord`

mod engine;
mod types;

pub use engine::VirtualClock;
pub use types::{IdleState, TimeUnit, VirtualTimeNs, DEFAULT_START_TIME_NS};
