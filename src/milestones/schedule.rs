//! Milestone schedule reconciliation.
//!
//! The schedule is derived on demand from the goal definition plus the
//! actions actually taken; nothing here is ever persisted. Action history
//! can be amended (undo), so a cached schedule would go stale silently.
//! Past checkpoints are frozen as historical record; the future portion is
//! regenerated from the present whenever it is asked for.

use serde::Serialize;

use crate::store::models::{ActionKind, CurveType, Document, Goal, GoalType, GoalUnit};

use super::curve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    Completed,
    Missed,
    Upcoming,
}

/// One checkpoint of a goal's pacing schedule, classified against reality.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// 1-based position in the concatenated schedule.
    pub index: usize,
    pub status: MilestoneStatus,
    /// Position as a fraction of the whole schedule.
    pub progress: f64,
}

/// Habit polarity, paired with the curve choice: a power schedule paces a
/// do-less habit, a sigmoid schedule paces a do-more habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Decreasing,
    Increasing,
}

fn direction(goal: &Goal) -> Direction {
    match goal.curve_type {
        CurveType::Power => Direction::Decreasing,
        CurveType::Sigmoid => Direction::Increasing,
    }
}

/// Quantity accrued toward the goal by actions strictly before `cutoff_ms`,
/// in the goal's own unit. Reads the chronologically sorted ledger view and
/// ignores anything logged before the goal existed.
pub fn amount_before(doc: &Document, goal: &Goal, cutoff_ms: i64) -> f64 {
    let mut total = 0.0;
    for action in doc.sorted_actions() {
        let ts_ms = action.timestamp * 1000;
        if ts_ms < goal.created_at || ts_ms >= cutoff_ms {
            continue;
        }
        total += match (&goal.unit, &action.kind) {
            (GoalUnit::Times, ActionKind::Used) => 1.0,
            (GoalUnit::Times, ActionKind::Timed(_)) => 1.0,
            (GoalUnit::Minutes, ActionKind::Timed(t)) => t.duration as f64 / 60.0,
            (GoalUnit::Dollars, ActionKind::Bought(b)) => b.spent_value(),
            _ => 0.0,
        };
    }
    total
}

/// Remaining quantity needed to hit the target, given actions so far.
pub fn remaining_needed(doc: &Document, goal: &Goal, now_ms: i64) -> f64 {
    (goal.goal_amount - amount_before(doc, goal, now_ms + 1)).max(0.0)
}

/// Build the full milestone view: frozen past checkpoints classified
/// met/missed, plus a future portion regenerated from now for exactly the
/// remaining quantity. Once the deadline has passed, nothing is rescheduled
/// past it; the goal is simply behind.
pub fn milestones(doc: &Document, goal: &Goal, now_ms: i64) -> Vec<Milestone> {
    if goal.goal_type != GoalType::Quantifiable {
        return Vec::new();
    }
    let total_count = checkpoint_count(goal.goal_amount);
    if total_count == 0 {
        return Vec::new();
    }

    let span_ms = goal.completion_timeline * 86_400_000;
    let deadline_ms = goal.created_at + span_ms;
    let original = curve::generate(goal.curve_type, goal.created_at, span_ms, total_count);
    let dir = direction(goal);

    // Past checkpoints: classified by the quantity accrued strictly before
    // each one, against its 0-indexed ordinal. A do-less goal meets a
    // checkpoint by staying at or under its allowance; a do-more goal by
    // exceeding the expected cumulative count.
    let mut schedule: Vec<(i64, MilestoneStatus)> = Vec::new();
    for (i, cp) in original.iter().enumerate() {
        if cp.timestamp > now_ms {
            break;
        }
        let done = amount_before(doc, goal, cp.timestamp);
        let met = match dir {
            Direction::Decreasing => done <= i as f64,
            Direction::Increasing => done > i as f64,
        };
        let status = if met {
            MilestoneStatus::Completed
        } else {
            MilestoneStatus::Missed
        };
        schedule.push((cp.timestamp, status));
    }

    let remaining = remaining_needed(doc, goal, now_ms);
    let remaining_count = checkpoint_count(remaining);
    if remaining_count > 0 && now_ms < deadline_ms {
        let future = curve::generate(
            goal.curve_type,
            now_ms,
            deadline_ms - now_ms,
            remaining_count,
        );
        for cp in future {
            schedule.push((cp.timestamp, MilestoneStatus::Upcoming));
        }
    }

    let total = schedule.len();
    schedule
        .into_iter()
        .enumerate()
        .map(|(i, (timestamp, status))| Milestone {
            timestamp,
            index: i + 1,
            status,
            progress: (i + 1) as f64 / total as f64,
        })
        .collect()
}

/// Upper bound on the checkpoints generated for one goal; the target
/// quantity is user input and feeds an allocation.
const MAX_CHECKPOINTS: usize = 1_000;

fn checkpoint_count(amount: f64) -> usize {
    if amount > 0.0 {
        (amount.ceil() as usize).min(MAX_CHECKPOINTS)
    } else {
        0
    }
}
