//! Timer reconstruction.
//!
//! Displayed time is always a function of stored absolute timestamps and
//! the current clock reading, never an accumulator bumped on each tick.
//! Interval callbacks do not fire reliably across sleep or background
//! suspension, so a tick only re-derives the display from scratch; the
//! previous in-memory value is never ground truth.

pub mod activity;

pub use activity::{
    discard_timer, elapsed_seconds, flag_forgotten_timers, pause_timer, resume_timer, start_timer,
    stop_timer, FORGOTTEN_AFTER_SECS,
};

use serde::Serialize;

/// Seconds remaining until a deadline. Clamped at zero.
pub fn remaining_seconds(deadline: i64, now: i64) -> i64 {
    (deadline - now).max(0)
}

/// Seconds elapsed since an event. Clamped at zero for backdated clocks.
pub fn elapsed_since(event: i64, now: i64) -> i64 {
    (now - event).max(0)
}

/// A total length of time broken into display units. Pure div/mod of the
/// total; rollover boundaries are never simulated by incrementing, which
/// would drift over long durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeParts {
    pub total_seconds: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

pub fn decompose(total_seconds: i64) -> TimeParts {
    let total = total_seconds.max(0);
    TimeParts {
        total_seconds: total,
        days: total / 86_400,
        hours: total % 86_400 / 3_600,
        minutes: total % 3_600 / 60,
        seconds: total % 60,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_is_pure_function_of_now() {
        let deadline = 10_000;
        // Whether zero or a thousand ticks fired in between changes nothing:
        // each reading derives from the same stored deadline.
        assert_eq!(remaining_seconds(deadline, 6_400), 3_600);
        assert_eq!(remaining_seconds(deadline, 8_200), 1_800);
        assert_eq!(remaining_seconds(deadline, 10_000), 0);
        assert_eq!(remaining_seconds(deadline, 99_999), 0);
    }

    #[test]
    fn elapsed_is_monotonic_in_now() {
        let event = 5_000;
        let mut last = 0;
        for now in [5_000, 5_001, 6_000, 500_000] {
            let elapsed = elapsed_since(event, now);
            assert!(elapsed >= last);
            last = elapsed;
        }
    }

    #[test]
    fn decompose_rollover_boundaries() {
        assert_eq!(
            decompose(59),
            TimeParts { total_seconds: 59, days: 0, hours: 0, minutes: 0, seconds: 59 }
        );
        assert_eq!(
            decompose(60),
            TimeParts { total_seconds: 60, days: 0, hours: 0, minutes: 1, seconds: 0 }
        );
        assert_eq!(
            decompose(86_400 + 3_661),
            TimeParts { total_seconds: 90_061, days: 1, hours: 1, minutes: 1, seconds: 1 }
        );
    }

    #[test]
    fn decompose_clamps_negative_totals() {
        assert_eq!(decompose(-5).total_seconds, 0);
    }
}
