//! Domain Layer - Scheduling Rules
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  Clock Module                  Task Module                  │
//! │  ├─ VirtualClock (atomics)     ├─ Runnable / Task           │
//! │  ├─ TimeUnit                   ├─ TaskQueue (BinaryHeap)    │
//! │  └─ IdleState                  └─ SharedTaskQueue + Condvar │
//! │                                                             │
//! │  Context Module                Scheduler Module             │
//! │  ├─ ContextId                  ├─ Scheduler                 │
//! │  ├─ ContextProvider            ├─ SchedulerBuilder          │
//! │  └─ ManualContext              └─ SchedulerConfig / Error   │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here installs logging or spawns threads; the domain only decides
//! what runs, when, and on whose behalf.

pub mod clock;
pub mod context;
pub mod scheduler;
pub mod task;

pub use clock::{IdleState, TimeUnit, VirtualClock, VirtualTimeNs, DEFAULT_START_TIME_NS};
pub use context::{ContextId, ContextProvider, ManualContext};
pub use scheduler::{Scheduler, SchedulerBuilder, SchedulerConfig, SchedulerError, SchedulerResult};
pub use task::{Runnable, SharedTaskQueue, Task, TaskError, TaskListener, TaskQueue, TaskResult};
