//! Virtual Clock Types
//!
//! Time values, unit conversion and the idle-state machine that governs
//! whether posted work runs on the spot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Virtual time in nanoseconds
///
/// Signed so that deltas between arbitrary instants can be compared with a
/// full-width comparison. Never narrow two of these to `i32` to order them.
pub type VirtualTimeNs = i64;

/// Clock value a fresh scheduler starts at (100 ms)
pub const DEFAULT_START_TIME_NS: VirtualTimeNs = 100 * NANOS_PER_MILLI;

const NANOS_PER_MICRO: i64 = 1_000;
const NANOS_PER_MILLI: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;
const NANOS_PER_MINUTE: i64 = 60 * NANOS_PER_SECOND;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Unit of a delay or a clock reading
///
/// Conversions into nanoseconds saturate at the `i64` bounds; conversions
/// out of nanoseconds truncate toward zero.
///
/// # Example
///
/// ```rust
/// use krepis_chrono::TimeUnit;
///
/// assert_eq!(TimeUnit::Milliseconds.to_nanos(3), 3_000_000);
/// assert_eq!(TimeUnit::Seconds.from_nanos(1_999_999_999), 1);
/// assert_eq!(TimeUnit::Seconds.from_nanos(-1_500_000_000), -1);
/// assert_eq!(TimeUnit::Days.to_nanos(i64::MAX), i64::MAX);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// Canonical unit of the clock
    Nanoseconds,
    /// 10^3 ns
    Microseconds,
    /// 10^6 ns
    Milliseconds,
    /// 10^9 ns
    Seconds,
    /// 60 s
    Minutes,
    /// 60 min
    Hours,
    /// 24 h
    Days,
}

impl TimeUnit {
    /// Nanoseconds in one unit
    #[inline]
    pub const fn nanos_per_unit(self) -> i64 {
        match self {
            Self::Nanoseconds => 1,
            Self::Microseconds => NANOS_PER_MICRO,
            Self::Milliseconds => NANOS_PER_MILLI,
            Self::Seconds => NANOS_PER_SECOND,
            Self::Minutes => NANOS_PER_MINUTE,
            Self::Hours => NANOS_PER_HOUR,
            Self::Days => NANOS_PER_DAY,
        }
    }

    /// Convert `amount` of this unit into nanoseconds, saturating on overflow
    #[inline]
    pub const fn to_nanos(self, amount: i64) -> VirtualTimeNs {
        amount.saturating_mul(self.nanos_per_unit())
    }

    /// Convert nanoseconds into this unit, truncating toward zero
    #[inline]
    pub const fn from_nanos(self, nanos: VirtualTimeNs) -> i64 {
        nanos / self.nanos_per_unit()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self {
            Self::Nanoseconds => "ns",
            Self::Microseconds => "us",
            Self::Milliseconds => "ms",
            Self::Seconds => "s",
            Self::Minutes => "min",
            Self::Hours => "h",
            Self::Days => "d",
        };
        f.write_str(suffix)
    }
}

/// Liveness mode of a scheduler
///
/// ```text
///            pause()                 set_idle_state(ConstantIdle)
///  Unpaused ─────────▶ Paused        any ─────────────────────────▶ ConstantIdle
///     ▲                  │              (drains the whole queue)
///     └──── unpause() ───┘
///       (drains due tasks)
/// ```
///
/// Every transition is legal from every state; there are no guards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdleState {
    /// Nothing runs unless the caller explicitly advances or runs tasks
    Paused,
    /// Zero-delay work posted from the home context runs immediately;
    /// future work waits for the clock to be advanced
    #[default]
    Unpaused,
    /// All posted work runs immediately, moving the clock forward as needed
    ConstantIdle,
}

impl IdleState {
    /// Check if this is `Paused`
    #[inline]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Check if this is `ConstantIdle`
    #[inline]
    pub const fn is_constant_idle(self) -> bool {
        matches!(self, Self::ConstantIdle)
    }

    /// Encoding used by the clock's atomic cell
    #[inline]
    pub(crate) const fn as_u8(self) -> u8 {
        match self {
            Self::Paused => 0,
            Self::Unpaused => 1,
            Self::ConstantIdle => 2,
        }
    }

    /// Inverse of [`IdleState::as_u8`]; unknown values decode as `Unpaused`
    #[inline]
    pub(crate) const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Paused,
            2 => Self::ConstantIdle,
            _ => Self::Unpaused,
        }
    }
}

impl fmt::Display for IdleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paused => write!(f, "PAUSED"),
            Self::Unpaused => write!(f, "UNPAUSED"),
            Self::ConstantIdle => write!(f, "CONSTANT_IDLE"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversion_round_trip_truncates() {
        assert_eq!(TimeUnit::Seconds.to_nanos(60), 60_000_000_000);
        assert_eq!(TimeUnit::Microseconds.from_nanos(1_999), 1);
        assert_eq!(TimeUnit::Milliseconds.from_nanos(-1_999_999), -1);
        assert_eq!(TimeUnit::Nanoseconds.from_nanos(42), 42);
    }

    #[test]
    fn test_unit_conversion_saturates() {
        assert_eq!(TimeUnit::Hours.to_nanos(i64::MAX), i64::MAX);
        assert_eq!(TimeUnit::Hours.to_nanos(i64::MIN), i64::MIN);
    }

    #[test]
    fn test_default_start_time_is_100ms() {
        assert_eq!(TimeUnit::Milliseconds.from_nanos(DEFAULT_START_TIME_NS), 100);
    }

    #[test]
    fn test_idle_state_encoding() {
        for state in [IdleState::Paused, IdleState::Unpaused, IdleState::ConstantIdle] {
            assert_eq!(IdleState::from_u8(state.as_u8()), state);
        }
        assert_eq!(IdleState::default(), IdleState::Unpaused);
        assert!(IdleState::Paused.is_paused());
        assert!(!IdleState::ConstantIdle.is_paused());
        assert!(IdleState::ConstantIdle.is_constant_idle());
        assert!(!IdleState::Unpaused.is_constant_idle());
    }
}
