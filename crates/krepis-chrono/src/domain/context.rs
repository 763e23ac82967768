//! Execution Contexts
//!
//! A scheduler has one *home* context (the simulated UI thread). Whether a
//! call originates from it decides between running posted work immediately
//! and queueing it. The domain never looks at OS threads directly: it asks a
//! [`ContextProvider`] for the caller's [`ContextId`] and compares ids.
//!
//! - [`ManualContext`]: explicit, settable context for cooperative tests
//! - [`ThreadContext`](crate::infrastructure::ThreadContext): one id per OS thread

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque execution-context token, compared by equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(u64);

impl ContextId {
    /// Create a context id from a raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw value
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

/// Source of the calling code's [`ContextId`]
pub trait ContextProvider: Send + Sync {
    /// Context of the caller
    fn current(&self) -> ContextId;
}

impl<C: ContextProvider + ?Sized> ContextProvider for Arc<C> {
    #[inline]
    fn current(&self) -> ContextId {
        (**self).current()
    }
}

/// Explicitly switched context
///
/// Every caller sees the same id until [`ManualContext::enter`] changes it,
/// which lets single-threaded tests pretend to be a worker.
///
/// ```rust
/// use krepis_chrono::{ContextId, ContextProvider, ManualContext};
///
/// let ctx = ManualContext::new(ContextId::new(0));
/// assert_eq!(ctx.current(), ContextId::new(0));
///
/// let previous = ctx.enter(ContextId::new(7));
/// assert_eq!(previous, ContextId::new(0));
/// assert_eq!(ctx.current(), ContextId::new(7));
/// ```
#[derive(Debug)]
pub struct ManualContext {
    current: AtomicU64,
}

impl ManualContext {
    /// Start in `initial`
    pub const fn new(initial: ContextId) -> Self {
        Self {
            current: AtomicU64::new(initial.0),
        }
    }

    /// Switch to `context`, returning the previous one
    pub fn enter(&self, context: ContextId) -> ContextId {
        ContextId(self.current.swap(context.0, Ordering::AcqRel))
    }

    /// Run `f` inside `context`, then switch back
    pub fn scoped<R>(&self, context: ContextId, f: impl FnOnce() -> R) -> R {
        let previous = self.enter(context);
        let result = f();
        self.enter(previous);
        result
    }
}

impl Default for ManualContext {
    fn default() -> Self {
        Self::new(ContextId::new(0))
    }
}

impl ContextProvider for ManualContext {
    #[inline]
    fn current(&self) -> ContextId {
        ContextId(self.current.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_context_switches() {
        let ctx = ManualContext::default();
        assert_eq!(ctx.current(), ContextId::new(0));

        assert_eq!(ctx.enter(ContextId::new(3)), ContextId::new(0));
        assert_eq!(ctx.current(), ContextId::new(3));
    }

    #[test]
    fn test_scoped_restores_previous() {
        let ctx = ManualContext::new(ContextId::new(1));

        let inside = ctx.scoped(ContextId::new(2), || ctx.current());
        assert_eq!(inside, ContextId::new(2));
        assert_eq!(ctx.current(), ContextId::new(1));
    }

    #[test]
    fn test_arc_provider_delegates() {
        let ctx = Arc::new(ManualContext::new(ContextId::new(9)));
        let shared: Arc<ManualContext> = Arc::clone(&ctx);

        ctx.enter(ContextId::new(4));
        assert_eq!(ContextProvider::current(&shared), ContextId::new(4));
    }

    #[test]
    fn test_context_display() {
        assert_eq!(ContextId::new(12).to_string(), "ctx#12");
    }
}
