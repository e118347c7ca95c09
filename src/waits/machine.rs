//! Wait lifecycle transitions.
//!
//! One wait commitment is active at a time. All transitions mutate the
//! document in memory; the caller flushes to the store. Validation failures
//! bubble; a transition invoked with no matching active wait is a logged
//! no-op because the caller may be racing a stale view.

use chrono::{Datelike, TimeZone, Utc};

use crate::error::{HoldoutError, Result};
use crate::notify::NotifyEvent;
use crate::store::models::{
    Action, ActionKind, ClickType, Document, NotificationKind, Statistics, WaitData, WaitStatus,
    WaitType, WAIT_STOPPED_ACTIVE,
};

/// `NONE -> ACTIVE`. Rejected while another wait is unresolved (including
/// one awaiting reconciliation) or when the deadline is not in the future.
pub fn create_wait(doc: &mut Document, now: i64, deadline: i64, wait_type: WaitType) -> Result<()> {
    if doc.active_wait().is_some() {
        return Err(HoldoutError::validation(
            "a wait is already active; resolve it before starting a new one",
        ));
    }
    if deadline <= now {
        return Err(HoldoutError::validation("wait deadline must be in the future"));
    }

    doc.action.push(Action::new(
        now,
        now,
        ActionKind::Wait(WaitData {
            wait_stamp: deadline,
            wait_type,
            status: WaitStatus::Active,
            wait_stopped: WAIT_STOPPED_ACTIVE,
        }),
    ));

    doc.option.active_wait_use = wait_type.covers_use();
    doc.option.active_wait_bought = wait_type.covers_bought();
    Ok(())
}

/// `ACTIVE -> ACTIVE` with a later deadline. Shortening is rejected; the
/// caller must end the wait instead.
pub fn extend_wait(doc: &mut Document, new_deadline: i64) -> Result<()> {
    let Some(action) = doc.active_wait_mut() else {
        log::warn!("extend requested with no active wait, ignoring");
        return Ok(());
    };
    let wait = action.wait_mut().expect("active wait action has wait data");

    if new_deadline <= wait.wait_stamp {
        return Err(HoldoutError::validation(
            "extended deadline must be later than the current one",
        ));
    }

    wait.wait_stamp = new_deadline;
    Ok(())
}

/// `ACTIVE -> ENDED_EARLY`. Always legal while a wait is active.
pub fn end_wait_early(doc: &mut Document, now: i64) -> bool {
    match finalize_active(doc, now, WaitStatus::EndedEarly, now) {
        Some(_) => true,
        None => {
            log::warn!("end requested with no active wait, ignoring");
            false
        }
    }
}

/// `ACTIVE -> COMPLETED`, fired when the countdown reaches zero while the
/// app is running. Idempotent against repeated zero-crossings: once the
/// status flips there is no active wait left to complete.
pub fn complete_wait(doc: &mut Document, now: i64) -> Option<NotifyEvent> {
    let deadline = doc.active_wait().and_then(Action::wait).map(|w| w.wait_stamp)?;
    if now < deadline {
        return None;
    }

    finalize_active(doc, now, WaitStatus::Completed, deadline)?;
    Some(notification(
        doc,
        now,
        NotificationKind::WaitCompleted,
        "You made it to the end of your wait.",
    ))
}

/// `ACTIVE` with a deadline in the past: the timer expired while the app
/// was not running, and the user must be asked how it went.
pub fn needs_reconciliation(doc: &Document, now: i64) -> bool {
    doc.active_wait()
        .and_then(Action::wait)
        .map(|w| w.wait_stamp < now)
        .unwrap_or(false)
}

/// Resolve a wait that expired while the app was away. "Made it" grants
/// full credit up to the original deadline; otherwise the caller supplies
/// the actual break time, which must lie within the wait's original window
/// (boundaries inclusive).
pub fn resolve_expired_wait(
    doc: &mut Document,
    now: i64,
    made_it: bool,
    break_time: Option<i64>,
) -> Result<bool> {
    if !needs_reconciliation(doc, now) {
        log::warn!("reconciliation requested with no expired wait, ignoring");
        return Ok(false);
    }

    let action = doc.active_wait().expect("checked above");
    let start = action.timestamp;
    let deadline = action.wait().expect("wait data").wait_stamp;

    if made_it {
        finalize_active(doc, now, WaitStatus::Completed, deadline);
        return Ok(true);
    }

    let break_time = break_time.ok_or_else(|| {
        HoldoutError::validation("a break time is required when the wait was not held")
    })?;
    if break_time < start || break_time > deadline {
        return Err(HoldoutError::validation(
            "break time must fall within the wait's original window",
        ));
    }

    finalize_active(doc, now, WaitStatus::EndedEarly, break_time);
    Ok(true)
}

/// A did-it/bought action arriving while a matching wait is active resolves
/// that wait as broken rather than leaving it orphaned. Returns true when a
/// wait was broken.
pub fn resolve_on_action(doc: &mut Document, now: i64, click: ClickType) -> bool {
    let matches = doc
        .active_wait()
        .and_then(Action::wait)
        .map(|w| match click {
            ClickType::Used => w.wait_type.covers_use(),
            ClickType::Bought => w.wait_type.covers_bought(),
            _ => false,
        })
        .unwrap_or(false);

    if !matches {
        return false;
    }

    // An expired-but-unreconciled wait can still be broken this way; credit
    // never extends past the original deadline.
    let deadline = doc
        .active_wait()
        .and_then(Action::wait)
        .map(|w| w.wait_stamp)
        .unwrap_or(now);
    finalize_active(doc, now, WaitStatus::EndedEarly, now.min(deadline)).is_some()
}

/// Flip the active wait to a terminal status and apply the rolling side
/// effects: longest-wait buckets, completion count, routing flags.
fn finalize_active(doc: &mut Document, now: i64, status: WaitStatus, stopped: i64) -> Option<i64> {
    let start;
    {
        let action = doc.active_wait_mut()?;
        start = action.timestamp;
        let wait = action.wait_mut().expect("active wait action has wait data");
        wait.status = status;
        wait.wait_stopped = stopped;
    }

    let held = (stopped - start).max(0);
    update_longest_wait(&mut doc.statistics, start, held, now);
    if status == WaitStatus::Completed {
        doc.statistics.waits_completed += 1;
    }

    doc.option.active_wait_use = false;
    doc.option.active_wait_bought = false;
    Some(held)
}

/// Update the longest-wait record for every bucket the wait's start falls
/// into, measured against now.
fn update_longest_wait(stats: &mut Statistics, start: i64, held: i64, now: i64) {
    let longest = &mut stats.longest_wait;
    longest.total = longest.total.max(held);

    let (Some(start_dt), Some(now_dt)) = (
        Utc.timestamp_opt(start, 0).single(),
        Utc.timestamp_opt(now, 0).single(),
    ) else {
        log::warn!("wait timestamps out of range, skipping bucket update");
        return;
    };

    if start_dt.iso_week() == now_dt.iso_week() {
        longest.week = longest.week.max(held);
    }
    if start_dt.year() == now_dt.year() && start_dt.month() == now_dt.month() {
        longest.month = longest.month.max(held);
    }
    if start_dt.year() == now_dt.year() {
        longest.year = longest.year.max(held);
    }
}

/// Record a notification in the document (when enabled) and hand back the
/// fire-and-forget event for the notifier collaborator.
pub fn notification(
    doc: &mut Document,
    now: i64,
    kind: NotificationKind,
    message: &str,
) -> NotifyEvent {
    if doc.option.notifications_enabled {
        doc.push_notification(now, kind, message);
    }
    NotifyEvent::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000;

    fn doc_with_wait(deadline: i64, wait_type: WaitType) -> Document {
        let mut doc = Document::default();
        create_wait(&mut doc, T0, deadline, wait_type).unwrap();
        doc
    }

    fn active_count(doc: &Document) -> usize {
        doc.action.iter().filter(|a| a.is_active_wait()).count()
    }

    #[test]
    fn create_sets_routing_flags_by_type() {
        let doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(doc.option.active_wait_use);
        assert!(!doc.option.active_wait_bought);

        let doc = doc_with_wait(T0 + 3600, WaitType::Both);
        assert!(doc.option.active_wait_use);
        assert!(doc.option.active_wait_bought);
    }

    #[test]
    fn create_rejects_past_deadline() {
        let mut doc = Document::default();
        let err = create_wait(&mut doc, T0, T0, WaitType::Use).unwrap_err();
        assert!(matches!(err, HoldoutError::Validation(_)));
        assert!(doc.action.is_empty());
    }

    #[test]
    fn second_create_rejected_while_active() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        let err = create_wait(&mut doc, T0 + 10, T0 + 7200, WaitType::Use).unwrap_err();
        assert!(matches!(err, HoldoutError::Validation(_)));
        assert_eq!(active_count(&doc), 1);
    }

    #[test]
    fn at_most_one_active_wait_across_lifecycles() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(end_wait_early(&mut doc, T0 + 100));
        create_wait(&mut doc, T0 + 200, T0 + 4000, WaitType::Bought).unwrap();
        assert_eq!(active_count(&doc), 1);
        assert_eq!(doc.action.len(), 2);
    }

    #[test]
    fn extend_requires_strictly_later_deadline() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);

        assert!(extend_wait(&mut doc, T0 + 3600).is_err());
        assert!(extend_wait(&mut doc, T0 + 1800).is_err());
        let wait = doc.active_wait().unwrap().wait().unwrap();
        assert_eq!(wait.wait_stamp, T0 + 3600);

        extend_wait(&mut doc, T0 + 7200).unwrap();
        let wait = doc.active_wait().unwrap().wait().unwrap();
        assert_eq!(wait.wait_stamp, T0 + 7200);
    }

    #[test]
    fn extend_without_active_wait_is_noop() {
        let mut doc = Document::default();
        assert!(extend_wait(&mut doc, T0 + 100).is_ok());
    }

    #[test]
    fn end_early_records_actual_stop() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(end_wait_early(&mut doc, T0 + 900));

        let wait = doc.action[0].wait().unwrap();
        assert_eq!(wait.status, WaitStatus::EndedEarly);
        assert_eq!(wait.wait_stopped, T0 + 900);
        assert!(!doc.option.active_wait_use);
        assert_eq!(doc.statistics.longest_wait.total, 900);
        assert_eq!(doc.statistics.waits_completed, 0);
    }

    #[test]
    fn natural_completion_is_idempotent() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);

        assert!(complete_wait(&mut doc, T0 + 1800).is_none());

        assert!(complete_wait(&mut doc, T0 + 3600).is_some());
        let wait = doc.action[0].wait().unwrap();
        assert_eq!(wait.status, WaitStatus::Completed);
        assert_eq!(wait.wait_stopped, T0 + 3600);
        assert_eq!(doc.statistics.waits_completed, 1);

        // Second zero-crossing finds nothing active.
        assert!(complete_wait(&mut doc, T0 + 3601).is_none());
        assert_eq!(doc.statistics.waits_completed, 1);
    }

    #[test]
    fn expired_while_away_is_flagged_not_auto_resolved() {
        let doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(!needs_reconciliation(&doc, T0 + 100));
        assert!(needs_reconciliation(&doc, T0 + 4000));
        // Still active in the ledger until the user answers.
        assert_eq!(doc.action[0].wait().unwrap().status, WaitStatus::Active);
    }

    #[test]
    fn reconciliation_full_credit() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(resolve_expired_wait(&mut doc, T0 + 9000, true, None).unwrap());

        let wait = doc.action[0].wait().unwrap();
        assert_eq!(wait.status, WaitStatus::Completed);
        assert_eq!(wait.wait_stopped, T0 + 3600);
        assert_eq!(doc.statistics.longest_wait.total, 3600);
    }

    #[test]
    fn reconciliation_break_time_window_is_inclusive() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(resolve_expired_wait(&mut doc, T0 + 9000, false, Some(T0 - 1)).is_err());

        // Exactly the deadline is accepted.
        assert!(resolve_expired_wait(&mut doc, T0 + 9000, false, Some(T0 + 3600)).unwrap());
        let wait = doc.action[0].wait().unwrap();
        assert_eq!(wait.status, WaitStatus::EndedEarly);
        assert_eq!(wait.wait_stopped, T0 + 3600);
    }

    #[test]
    fn reconciliation_requires_break_time_on_no() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(resolve_expired_wait(&mut doc, T0 + 9000, false, None).is_err());
        // Untouched after the rejected attempt.
        assert!(doc.action[0].is_active_wait());
    }

    #[test]
    fn matching_action_breaks_active_wait() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        assert!(!resolve_on_action(&mut doc, T0 + 500, ClickType::Bought));
        assert!(doc.action[0].is_active_wait());

        assert!(resolve_on_action(&mut doc, T0 + 500, ClickType::Used));
        let wait = doc.action[0].wait().unwrap();
        assert_eq!(wait.status, WaitStatus::EndedEarly);
        assert_eq!(wait.wait_stopped, T0 + 500);
    }

    #[test]
    fn longest_wait_buckets_keyed_by_start() {
        let mut doc = doc_with_wait(T0 + 3600, WaitType::Use);
        // Resolve long after the start's week/month/year have passed.
        let two_years = 2 * 366 * 86_400;
        assert!(resolve_expired_wait(&mut doc, T0 + two_years, true, None).unwrap());

        assert_eq!(doc.statistics.longest_wait.total, 3600);
        assert_eq!(doc.statistics.longest_wait.week, 0);
        assert_eq!(doc.statistics.longest_wait.month, 0);
        assert_eq!(doc.statistics.longest_wait.year, 0);
    }
}
