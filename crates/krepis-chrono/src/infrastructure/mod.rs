//! Infrastructure Layer - Runtime Integrations
//!
//! Concrete implementations of domain seams that depend on the host
//! runtime rather than on scheduler rules.
//!
//! # Responsibilities
//! - Mapping OS threads to execution contexts

mod thread_context;

pub use thread_context::ThreadContext;
