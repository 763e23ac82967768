//! OS-Thread Context Registry
//!
//! # Design
//!
//! ```text
//! ThreadContext
//! ├─ contexts: Arc<DashMap<std::thread::ThreadId, ContextId>>
//! └─ next_id:  AtomicU64
//!
//! per thread (thread-local)
//! └─ ExitGuard: Weak handles to every registry the thread joined
//! ```
//!
//! The first call from a thread allocates the next id; every later call from
//! the same thread returns it. Ids are never reused while the registry lives,
//! so a worker that exits can't be mistaken for the home thread.
//!
//! When a thread exits, its guard evicts the thread from every registry that
//! is still alive, so the map only holds live threads.

use crate::domain::context::{ContextId, ContextProvider};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

type Registry = DashMap<ThreadId, ContextId>;

thread_local! {
    static EXIT_GUARD: ExitGuard = ExitGuard::new();
}

/// Evicts the owning thread from its registries when thread-local storage
/// is torn down
struct ExitGuard {
    thread: ThreadId,
    registries: RefCell<Vec<Weak<Registry>>>,
}

impl ExitGuard {
    fn new() -> Self {
        Self {
            thread: thread::current().id(),
            registries: RefCell::new(Vec::new()),
        }
    }

    fn track(&self, registry: &Arc<Registry>) {
        let mut registries = self.registries.borrow_mut();
        registries.retain(|weak| weak.strong_count() > 0);
        registries.push(Arc::downgrade(registry));
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        for registry in self.registries.get_mut().drain(..) {
            if let Some(registry) = registry.upgrade() {
                registry.remove(&self.thread);
            }
        }
    }
}

/// [`ContextProvider`] mapping each OS thread to its own [`ContextId`]
#[derive(Debug, Default)]
pub struct ThreadContext {
    contexts: Arc<Registry>,
    next_id: AtomicU64,
}

impl ThreadContext {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Context of `thread`, if it is alive and has called into the registry
    pub fn context_of(&self, thread: ThreadId) -> Option<ContextId> {
        self.contexts.get(&thread).map(|entry| *entry)
    }

    /// Number of live threads holding a context
    pub fn known_threads(&self) -> usize {
        self.contexts.len()
    }
}

impl ContextProvider for ThreadContext {
    fn current(&self) -> ContextId {
        let thread = thread::current().id();
        if let Some(id) = self.context_of(thread) {
            return id;
        }

        let id = match self.contexts.entry(thread) {
            Entry::Occupied(entry) => return *entry.get(),
            Entry::Vacant(entry) => {
                let id = ContextId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
                entry.insert(id);
                id
            }
        };

        // Threads already tearing down their locals keep the entry
        let _ = EXIT_GUARD.try_with(|guard| guard.track(&self.contexts));
        id
    }
}
