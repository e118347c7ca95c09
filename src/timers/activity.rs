//! Pausable count-up activity timers.
//!
//! A timer is ephemeral document state until stopped, at which point it
//! becomes a durable `timed` action and leaves `activeTimers`. Pause folds
//! the live running delta into `accumulated_seconds`; resume re-anchors
//! `started_at` without touching the accumulator. The persisted fields
//! alone fully determine elapsed time at any instant, which is what makes
//! pause/resume safe across reloads.

use uuid::Uuid;

use crate::store::models::{
    Action, ActionKind, ActivityTimer, Document, NotificationKind, TimedData, TimerStatus,
};

/// A timer still running past this total is probably forgotten.
pub const FORGOTTEN_AFTER_SECS: i64 = 86_400;

/// Elapsed seconds for a timer at the given clock reading.
pub fn elapsed_seconds(timer: &ActivityTimer, now: i64) -> i64 {
    let live = match timer.status {
        TimerStatus::Running => (now - timer.started_at).max(0),
        TimerStatus::Paused => 0,
    };
    timer.accumulated_seconds + live
}

pub fn start_timer(doc: &mut Document, now: i64) -> Uuid {
    let timer = ActivityTimer {
        id: Uuid::new_v4(),
        started_at: now,
        paused_at: None,
        accumulated_seconds: 0,
        status: TimerStatus::Running,
        long_running_notified: false,
    };
    let id = timer.id;
    doc.active_timers.push(timer);
    id
}

pub fn pause_timer(doc: &mut Document, id: Uuid, now: i64) -> bool {
    let Some(timer) = doc.timer_mut(id) else {
        log::warn!("pause requested for unknown timer {}, ignoring", id);
        return false;
    };
    if timer.status == TimerStatus::Paused {
        log::warn!("timer {} is already paused, ignoring", id);
        return false;
    }

    timer.accumulated_seconds += (now - timer.started_at).max(0);
    timer.paused_at = Some(now);
    timer.status = TimerStatus::Paused;
    true
}

pub fn resume_timer(doc: &mut Document, id: Uuid, now: i64) -> bool {
    let Some(timer) = doc.timer_mut(id) else {
        log::warn!("resume requested for unknown timer {}, ignoring", id);
        return false;
    };
    if timer.status == TimerStatus::Running {
        log::warn!("timer {} is already running, ignoring", id);
        return false;
    }

    timer.started_at = now;
    timer.paused_at = None;
    timer.status = TimerStatus::Running;
    true
}

/// Convert the timer into a durable `timed` action and drop it from the
/// active set. Returns the logged duration.
pub fn stop_timer(
    doc: &mut Document,
    id: Uuid,
    now: i64,
    amount: Option<f64>,
    unit: Option<String>,
) -> Option<i64> {
    let Some(timer) = doc.timer(id) else {
        log::warn!("stop requested for unknown timer {}, ignoring", id);
        return None;
    };

    let duration = elapsed_seconds(timer, now);
    doc.active_timers.retain(|t| t.id != id);
    doc.action.push(Action::new(
        now,
        now,
        ActionKind::Timed(TimedData {
            duration,
            amount,
            unit,
        }),
    ));
    Some(duration)
}

/// Drop the timer without logging anything.
pub fn discard_timer(doc: &mut Document, id: Uuid) -> bool {
    let before = doc.active_timers.len();
    doc.active_timers.retain(|t| t.id != id);
    before != doc.active_timers.len()
}

/// Flag timers that have been going for over a day, once each. Returns the
/// ids that were newly flagged so the caller can notify.
pub fn flag_forgotten_timers(doc: &mut Document, now: i64) -> Vec<Uuid> {
    let mut flagged = Vec::new();
    for timer in &mut doc.active_timers {
        if !timer.long_running_notified && elapsed_seconds(timer, now) >= FORGOTTEN_AFTER_SECS {
            timer.long_running_notified = true;
            flagged.push(timer.id);
        }
    }
    for id in &flagged {
        doc.push_notification(
            now,
            NotificationKind::ForgottenTimer,
            &format!("Activity timer {} has been running for over 24 hours.", id),
        );
    }
    flagged
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000;

    #[test]
    fn pause_excludes_wall_clock_time() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);

        // Run 10s, pause, sit for 50s (app may even be closed), resume,
        // run 5s more, stop.
        assert!(pause_timer(&mut doc, id, T0 + 10));
        assert!(resume_timer(&mut doc, id, T0 + 60));
        let duration = stop_timer(&mut doc, id, T0 + 65, None, None).unwrap();

        assert_eq!(duration, 15);
        assert!(doc.active_timers.is_empty());
        match &doc.action[0].kind {
            ActionKind::Timed(t) => assert_eq!(t.duration, 15),
            other => panic!("expected timed action, got {:?}", other),
        }
    }

    #[test]
    fn elapsed_reconstructs_identically_after_any_gap() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);
        let timer = doc.timer(id).unwrap().clone();

        // No path dependence: the same reading falls out no matter how many
        // intermediate observations were made.
        let direct = elapsed_seconds(&timer, T0 + 5_000);
        let _ = elapsed_seconds(&timer, T0 + 1);
        let _ = elapsed_seconds(&timer, T0 + 2_500);
        let again = elapsed_seconds(&timer, T0 + 5_000);
        assert_eq!(direct, 5_000);
        assert_eq!(again, direct);
    }

    #[test]
    fn paused_timer_reads_accumulator_only() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);
        pause_timer(&mut doc, id, T0 + 30);

        let timer = doc.timer(id).unwrap();
        assert_eq!(timer.accumulated_seconds, 30);
        assert_eq!(elapsed_seconds(timer, T0 + 9_999), 30);
    }

    #[test]
    fn redundant_pause_and_resume_are_noops() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);

        assert!(!resume_timer(&mut doc, id, T0 + 5));
        assert!(pause_timer(&mut doc, id, T0 + 10));
        assert!(!pause_timer(&mut doc, id, T0 + 20));
        assert_eq!(doc.timer(id).unwrap().accumulated_seconds, 10);
    }

    #[test]
    fn unknown_timer_operations_are_noops() {
        let mut doc = Document::default();
        let ghost = Uuid::new_v4();
        assert!(!pause_timer(&mut doc, ghost, T0));
        assert!(stop_timer(&mut doc, ghost, T0, None, None).is_none());
        assert!(!discard_timer(&mut doc, ghost));
        assert!(doc.action.is_empty());
    }

    #[test]
    fn discard_drops_without_logging() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);
        assert!(discard_timer(&mut doc, id));
        assert!(doc.active_timers.is_empty());
        assert!(doc.action.is_empty());
    }

    #[test]
    fn forgotten_timer_flagged_once() {
        let mut doc = Document::default();
        let id = start_timer(&mut doc, T0);

        assert!(flag_forgotten_timers(&mut doc, T0 + 3600).is_empty());

        let flagged = flag_forgotten_timers(&mut doc, T0 + FORGOTTEN_AFTER_SECS);
        assert_eq!(flagged, vec![id]);
        assert_eq!(doc.notifications.len(), 1);
        assert_eq!(doc.notifications[0].kind, NotificationKind::ForgottenTimer);

        // Never flagged twice.
        assert!(flag_forgotten_timers(&mut doc, T0 + 2 * FORGOTTEN_AFTER_SECS).is_empty());
        assert_eq!(doc.notifications.len(), 1);
    }
}
