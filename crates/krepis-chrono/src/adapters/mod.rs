//! Adapters Layer - Ports & Adapters Pattern
//!
//! Adapters connecting scheduler events to the outside world.
//!
//! # Outbound adapters
//! - [`TracingListener`]: queue insertions → `tracing` events
//! - [`CountingListener`]: queue insertions → shared counter

mod listeners;

pub use listeners::{CountingListener, TracingListener};
