//! Virtual Clock Engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    VirtualClock                         │
//! ├───────────────────────┬─────────────────────────────────┤
//! │  now_ns: AtomicI64    │  idle_state: AtomicU8           │
//! │  (fetch_max writes)   │  (IdleState::as_u8 encoding)    │
//! └───────────────────────┴─────────────────────────────────┘
//!          ▲ lock-free reads from any thread
//! ```
//!
//! The clock lives outside the scheduler's queue and dispatch locks: a worker
//! thread can read the time while the home thread is in the middle of running
//! a task that holds them.

use super::types::{IdleState, VirtualTimeNs};
use std::sync::atomic::{AtomicI64, AtomicU8, Ordering};

/// Lock-free virtual clock and idle-state cell
///
/// # Invariant
///
/// `now_ns()` never decreases. Every write goes through `fetch_max`, so
/// executing a task that was scheduled before the current time leaves the
/// clock where it is.
#[derive(Debug)]
pub struct VirtualClock {
    /// Current virtual time
    now_ns: AtomicI64,

    /// Current liveness mode
    idle_state: AtomicU8,
}

impl VirtualClock {
    /// Create a clock reading `start_ns` in the given idle state
    ///
    /// ```rust
    /// use krepis_chrono::domain::clock::{IdleState, VirtualClock};
    ///
    /// let clock = VirtualClock::new(100, IdleState::Paused);
    /// assert_eq!(clock.now_ns(), 100);
    /// assert!(clock.idle_state().is_paused());
    /// ```
    pub const fn new(start_ns: VirtualTimeNs, idle_state: IdleState) -> Self {
        Self {
            now_ns: AtomicI64::new(start_ns),
            idle_state: AtomicU8::new(idle_state.as_u8()),
        }
    }

    /// Get current virtual time
    #[inline]
    pub fn now_ns(&self) -> VirtualTimeNs {
        self.now_ns.load(Ordering::Acquire)
    }

    /// Move the clock forward to `target_ns`
    ///
    /// Targets in the past are ignored. Returns the clock value after the
    /// call.
    #[inline]
    pub fn advance_to(&self, target_ns: VirtualTimeNs) -> VirtualTimeNs {
        let previous = self.now_ns.fetch_max(target_ns, Ordering::AcqRel);
        previous.max(target_ns)
    }

    /// Move the clock forward by `delta_ns` (saturating, negative deltas ignored)
    #[inline]
    pub fn advance_by(&self, delta_ns: VirtualTimeNs) -> VirtualTimeNs {
        self.advance_to(self.now_ns().saturating_add(delta_ns.max(0)))
    }

    /// Get current idle state
    #[inline]
    pub fn idle_state(&self) -> IdleState {
        IdleState::from_u8(self.idle_state.load(Ordering::Acquire))
    }

    /// Replace the idle state, returning the previous one
    #[inline]
    pub fn swap_idle_state(&self, state: IdleState) -> IdleState {
        IdleState::from_u8(self.idle_state.swap(state.as_u8(), Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_clock_never_moves_backward() {
        let clock = VirtualClock::new(1_000, IdleState::Unpaused);

        assert_eq!(clock.advance_to(500), 1_000);
        assert_eq!(clock.now_ns(), 1_000);

        assert_eq!(clock.advance_to(2_000), 2_000);
        assert_eq!(clock.advance_by(-50), 2_000);
        assert_eq!(clock.advance_by(50), 2_050);
    }

    #[test]
    fn test_advance_by_saturates() {
        let clock = VirtualClock::new(i64::MAX - 1, IdleState::Unpaused);
        assert_eq!(clock.advance_by(10), i64::MAX);
    }

    #[test]
    fn test_swap_idle_state() {
        let clock = VirtualClock::new(0, IdleState::Unpaused);

        assert_eq!(clock.swap_idle_state(IdleState::Paused), IdleState::Unpaused);
        assert_eq!(clock.swap_idle_state(IdleState::ConstantIdle), IdleState::Paused);
        assert_eq!(clock.idle_state(), IdleState::ConstantIdle);
    }

    #[test]
    fn test_concurrent_advances_keep_maximum() {
        let clock = Arc::new(VirtualClock::new(0, IdleState::Unpaused));

        let handles: Vec<_> = (1..=8)
            .map(|i| {
                let clock = Arc::clone(&clock);
                thread::spawn(move || {
                    for step in 0..1_000 {
                        clock.advance_to(i * 1_000 + step);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(clock.now_ns(), 8_999);
    }
}
