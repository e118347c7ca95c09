//! Application state and the command/query surface the UI layer calls.
//!
//! `App` owns the loaded document, the store, the clock and the notifier;
//! every mutation is a method that edits the in-memory document and flushes
//! the whole blob before returning. There is no other writer, so two
//! mutations can never interleave.

use std::sync::Arc;

use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{HoldoutError, Result};
use crate::milestones::{self, Milestone};
use crate::notify::{Notifier, NotifyEvent};
use crate::store::models::{
    Action, ActionKind, ActivityTimer, BoughtData, ClickType, CurveType, Document, Goal,
    GoalStatus, GoalType, GoalUnit, MoodData, Notification, NotificationKind, TimedData, WaitType,
};
use crate::store::LedgerStore;
use crate::timers::{self, TimeParts};
use crate::waits::{self, machine, WaitState};

pub struct App {
    store: LedgerStore,
    doc: Document,
    clock: Arc<dyn Clock>,
    notifier: Box<dyn Notifier>,
    /// Set at load time when the active wait's deadline passed while the
    /// app was not running. Cleared only by reconciliation (or by undoing
    /// the wait itself).
    pending_reconciliation: bool,
}

impl App {
    /// Load (and migrate) the stored document and detect a wait that
    /// expired while the app was away. That wait stays active in the ledger
    /// until the user answers; only the flag and a notification are raised
    /// here.
    pub fn open(
        store: LedgerStore,
        clock: Arc<dyn Clock>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self> {
        let doc = store.load_or_default()?;
        let mut app = Self {
            store,
            doc,
            clock,
            notifier,
            pending_reconciliation: false,
        };

        if waits::needs_reconciliation(&app.doc, app.clock.now_secs()) {
            app.pending_reconciliation = true;
            let already_flagged = app
                .doc
                .notifications
                .iter()
                .any(|n| n.kind == NotificationKind::WaitNeedsReconciliation && !n.read);
            if !already_flagged {
                let event = machine::notification(
                    &mut app.doc,
                    app.clock.now_secs(),
                    NotificationKind::WaitNeedsReconciliation,
                    "Your wait ended while you were away. Did you make it?",
                );
                app.flush()?;
                app.notifier.notify(&event);
            }
        }

        Ok(app)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn flush(&self) -> Result<()> {
        self.store.save(&self.doc)
    }

    fn emit(&self, event: NotifyEvent) {
        self.notifier.notify(&event);
    }

    // ===== Action logging =====

    /// Log a did-it event. Breaks a matching active wait first. `timestamp`
    /// backdates the real-world event; the write time is always now.
    pub fn log_used(&mut self, timestamp: Option<i64>) -> Result<()> {
        self.log_simple(ClickType::Used, timestamp, ActionKind::Used)
    }

    /// Log a resisted-craving event.
    pub fn log_craved(&mut self, timestamp: Option<i64>) -> Result<()> {
        self.log_simple(ClickType::Craved, timestamp, ActionKind::Craved)
    }

    /// Log money spent on the habit. `spent` stays a decimal string on the
    /// wire but must parse as a non-negative number.
    pub fn log_bought(&mut self, spent: String, timestamp: Option<i64>) -> Result<()> {
        match spent.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => {}
            _ => {
                return Err(HoldoutError::validation(
                    "spent amount must be a non-negative number",
                ))
            }
        }
        self.log_simple(
            ClickType::Bought,
            timestamp,
            ActionKind::Bought(BoughtData { spent }),
        )
    }

    fn log_simple(
        &mut self,
        click: ClickType,
        timestamp: Option<i64>,
        kind: ActionKind,
    ) -> Result<()> {
        let now = self.clock.now_secs();
        if waits::resolve_on_action(&mut self.doc, now, click) {
            self.pending_reconciliation = false;
        }
        self.doc
            .action
            .push(Action::new(timestamp.unwrap_or(now), now, kind));
        self.refresh_goal_completion();
        self.flush()
    }

    /// Log a mood check-in, optionally attached to a behavioral goal.
    pub fn log_mood(
        &mut self,
        comment: String,
        smiley: u8,
        behavioral_goal_id: Option<Uuid>,
    ) -> Result<()> {
        if smiley > 4 {
            return Err(HoldoutError::validation("smiley must be between 0 and 4"));
        }
        if let Some(id) = behavioral_goal_id {
            if self.doc.goal(id).is_none() {
                return Err(HoldoutError::NotFound(format!("goal {} not found", id)));
            }
        }

        let now = self.clock.now_secs();
        self.doc.action.push(Action::new(
            now,
            now,
            ActionKind::Mood(MoodData {
                comment,
                smiley,
                behavioral_goal_id,
            }),
        ));
        self.flush()
    }

    /// Log a timed activity directly, without going through a live timer.
    pub fn log_timed(
        &mut self,
        duration: i64,
        amount: Option<f64>,
        unit: Option<String>,
        timestamp: Option<i64>,
    ) -> Result<()> {
        if duration < 0 {
            return Err(HoldoutError::validation("duration must not be negative"));
        }
        let now = self.clock.now_secs();
        self.doc.action.push(Action::new(
            timestamp.unwrap_or(now),
            now,
            ActionKind::Timed(TimedData {
                duration,
                amount,
                unit,
            }),
        ));
        self.refresh_goal_completion();
        self.flush()
    }

    /// Remove the most recently appended action. The only removal the
    /// ledger supports.
    pub fn undo_last(&mut self) -> Result<Option<ClickType>> {
        let Some(popped) = self.doc.action.pop() else {
            log::warn!("undo requested on an empty ledger, ignoring");
            return Ok(None);
        };

        if popped.is_active_wait() {
            self.doc.option.active_wait_use = false;
            self.doc.option.active_wait_bought = false;
            self.pending_reconciliation = false;
        }

        let click = popped.click_type();
        self.flush()?;
        Ok(Some(click))
    }

    // ===== Wait commands =====

    pub fn create_wait(&mut self, deadline: i64, wait_type: WaitType) -> Result<()> {
        machine::create_wait(&mut self.doc, self.clock.now_secs(), deadline, wait_type)?;
        self.flush()
    }

    pub fn extend_wait(&mut self, new_deadline: i64) -> Result<()> {
        if self.pending_reconciliation {
            return Err(HoldoutError::validation(
                "this wait expired while the app was away; resolve it instead",
            ));
        }
        machine::extend_wait(&mut self.doc, new_deadline)?;
        self.flush()
    }

    pub fn end_wait_early(&mut self) -> Result<bool> {
        if self.pending_reconciliation {
            return Err(HoldoutError::validation(
                "this wait expired while the app was away; resolve it instead",
            ));
        }
        let ended = machine::end_wait_early(&mut self.doc, self.clock.now_secs());
        if ended {
            self.pending_reconciliation = false;
            self.flush()?;
        }
        Ok(ended)
    }

    /// Answer the "did you make it?" prompt for a wait that expired while
    /// the app was away. Mandatory before any new wait can be created.
    pub fn resolve_expired_wait(&mut self, made_it: bool, break_time: Option<i64>) -> Result<bool> {
        let now = self.clock.now_secs();
        let resolved = machine::resolve_expired_wait(&mut self.doc, now, made_it, break_time)?;
        if resolved {
            self.pending_reconciliation = false;
            for n in &mut self.doc.notifications {
                if n.kind == NotificationKind::WaitNeedsReconciliation {
                    n.read = true;
                }
            }
            self.flush()?;
        }
        Ok(resolved)
    }

    // ===== Queries =====

    pub fn wait_state(&self) -> WaitState {
        let now = self.clock.now_secs();
        let state = waits::wait_state(&self.doc, now);
        if !self.pending_reconciliation {
            // The countdown crossed zero while the app was running; natural
            // completion on the next tick, not reconciliation.
            if let WaitState::NeedsReconciliation {
                started_at,
                deadline,
                wait_type,
            } = state
            {
                return WaitState::Active {
                    started_at,
                    deadline,
                    wait_type,
                    remaining_seconds: 0,
                };
            }
        }
        state
    }

    /// Countdown display for the active wait.
    pub fn wait_countdown(&self) -> Option<TimeParts> {
        match self.wait_state() {
            WaitState::Active {
                remaining_seconds, ..
            } => Some(timers::decompose(remaining_seconds)),
            _ => None,
        }
    }

    /// Count-up display since the last action of the given type.
    pub fn time_since_last(&self, click: ClickType) -> Option<TimeParts> {
        let last = self.doc.last_timestamp_of(click)?;
        Some(timers::decompose(timers::elapsed_since(
            last,
            self.clock.now_secs(),
        )))
    }

    pub fn timer_elapsed(&self, id: Uuid) -> Option<TimeParts> {
        let timer = self.doc.timer(id)?;
        Some(timers::decompose(timers::elapsed_seconds(
            timer,
            self.clock.now_secs(),
        )))
    }

    pub fn active_timers(&self) -> &[ActivityTimer] {
        &self.doc.active_timers
    }

    pub fn goal_milestones(&self, id: Uuid) -> Result<Vec<Milestone>> {
        let goal = self
            .doc
            .goal(id)
            .ok_or_else(|| HoldoutError::NotFound(format!("goal {} not found", id)))?;
        Ok(milestones::milestones(
            &self.doc,
            goal,
            self.clock.now_millis(),
        ))
    }

    /// The ledger in chronological order (array order is append order).
    pub fn history(&self) -> Vec<&Action> {
        self.doc.sorted_actions()
    }

    pub fn unread_notifications(&self) -> Vec<&Notification> {
        self.doc.notifications.iter().filter(|n| !n.read).collect()
    }

    // ===== Tick =====

    /// One-second cadence entry point. Re-derives everything from stored
    /// timestamps; safe to call after an arbitrary suspension, and safe to
    /// call twice for the same instant.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.clock.now_secs();
        let mut dirty = false;

        if !self.pending_reconciliation {
            if let Some(event) = machine::complete_wait(&mut self.doc, now) {
                dirty = true;
                self.emit(event);
            }
        }

        for id in timers::flag_forgotten_timers(&mut self.doc, now) {
            dirty = true;
            self.emit(NotifyEvent::new(
                NotificationKind::ForgottenTimer,
                format!("Activity timer {} has been running for over 24 hours.", id),
            ));
        }

        if dirty {
            self.flush()?;
        }
        Ok(())
    }

    // ===== Activity timers =====

    pub fn start_activity_timer(&mut self) -> Result<Uuid> {
        let id = timers::start_timer(&mut self.doc, self.clock.now_secs());
        self.flush()?;
        Ok(id)
    }

    pub fn pause_activity_timer(&mut self, id: Uuid) -> Result<bool> {
        let changed = timers::pause_timer(&mut self.doc, id, self.clock.now_secs());
        if changed {
            self.flush()?;
        }
        Ok(changed)
    }

    pub fn resume_activity_timer(&mut self, id: Uuid) -> Result<bool> {
        let changed = timers::resume_timer(&mut self.doc, id, self.clock.now_secs());
        if changed {
            self.flush()?;
        }
        Ok(changed)
    }

    /// Stop a timer, logging it as a `timed` action. Returns the duration.
    pub fn stop_activity_timer(
        &mut self,
        id: Uuid,
        amount: Option<f64>,
        unit: Option<String>,
    ) -> Result<Option<i64>> {
        let logged = timers::stop_timer(&mut self.doc, id, self.clock.now_secs(), amount, unit);
        if logged.is_some() {
            self.refresh_goal_completion();
            self.flush()?;
        }
        Ok(logged)
    }

    pub fn discard_activity_timer(&mut self, id: Uuid) -> Result<bool> {
        let dropped = timers::discard_timer(&mut self.doc, id);
        if dropped {
            self.flush()?;
        }
        Ok(dropped)
    }

    // ===== Behavioral goals =====

    pub fn create_goal(
        &mut self,
        goal_type: GoalType,
        unit: GoalUnit,
        goal_amount: f64,
        completion_timeline: i64,
        curve_type: CurveType,
    ) -> Result<Uuid> {
        if goal_type == GoalType::Quantifiable && !(goal_amount.is_finite() && goal_amount > 0.0) {
            return Err(HoldoutError::validation(
                "goal amount must be a positive number",
            ));
        }
        if completion_timeline < 1 {
            return Err(HoldoutError::validation(
                "completion timeline must be at least one day",
            ));
        }

        let goal = Goal {
            id: Uuid::new_v4(),
            goal_type,
            unit,
            goal_amount,
            created_at: self.clock.now_millis(),
            completion_timeline,
            curve_type,
            status: GoalStatus::Active,
        };
        let id = goal.id;
        self.doc.behavioral_goals.push(goal);
        self.flush()?;
        Ok(id)
    }

    pub fn abandon_goal(&mut self, id: Uuid) -> Result<bool> {
        let Some(goal) = self.doc.behavioral_goals.iter_mut().find(|g| g.id == id) else {
            log::warn!("abandon requested for unknown goal {}, ignoring", id);
            return Ok(false);
        };
        goal.status = GoalStatus::Abandoned;
        self.flush()?;
        Ok(true)
    }

    pub fn goals(&self) -> &[Goal] {
        &self.doc.behavioral_goals
    }

    /// Flip do-more goals to completed once the ledger shows the target
    /// quantity reached. Do-less goals have no early completion; they run
    /// to their deadline.
    fn refresh_goal_completion(&mut self) {
        let now_ms = self.clock.now_millis();
        let now = self.clock.now_secs();

        let completed: Vec<Uuid> = self
            .doc
            .behavioral_goals
            .iter()
            .filter(|g| {
                g.status == GoalStatus::Active
                    && g.goal_type == GoalType::Quantifiable
                    && g.curve_type == CurveType::Sigmoid
                    && milestones::remaining_needed(&self.doc, g, now_ms) <= 0.0
            })
            .map(|g| g.id)
            .collect();

        for id in completed {
            if let Some(goal) = self.doc.behavioral_goals.iter_mut().find(|g| g.id == id) {
                goal.status = GoalStatus::Completed;
            }
            let event = machine::notification(
                &mut self.doc,
                now,
                NotificationKind::GoalCompleted,
                "You reached a behavioral goal.",
            );
            self.emit(event);
        }
    }
}
