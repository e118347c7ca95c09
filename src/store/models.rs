//! Persisted document model.
//!
//! One `Document` per installation, serialized as a single JSON blob with a
//! top-level `version` field driving migration (see `store::migration`).
//! Wire names are camelCase; legacy `goal*` spellings from pre-v3 blobs are
//! accepted as aliases, canonical `wait*` names are always written.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Version written by the last migration gate.
pub const CURRENT_VERSION: u32 = 4;

/// Sentinel for a wait that has not stopped yet.
pub const WAIT_STOPPED_ACTIVE: i64 = -1;

/// The whole persisted state. Read-modify-written as a unit; a write always
/// contains a complete, migrated-version document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub version: u32,
    #[serde(default)]
    pub action: Vec<Action>,
    #[serde(default)]
    pub baseline: Baseline,
    #[serde(default)]
    pub option: Options,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default)]
    pub behavioral_goals: Vec<Goal>,
    #[serde(default)]
    pub active_timers: Vec<ActivityTimer>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            action: Vec::new(),
            baseline: Baseline::default(),
            option: Options::default(),
            statistics: Statistics::default(),
            behavioral_goals: Vec::new(),
            active_timers: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl Document {
    /// Actions in chronological order. The `action` array is append-ordered
    /// and `timestamp` may be backdated, so array order is NOT chronological;
    /// consumers that care about time must go through this accessor.
    pub fn sorted_actions(&self) -> Vec<&Action> {
        let mut sorted: Vec<&Action> = self.action.iter().collect();
        sorted.sort_by_key(|a| a.timestamp);
        sorted
    }

    /// The single active wait, if any.
    pub fn active_wait(&self) -> Option<&Action> {
        self.action.iter().find(|a| a.is_active_wait())
    }

    pub fn active_wait_mut(&mut self) -> Option<&mut Action> {
        self.action.iter_mut().find(|a| a.is_active_wait())
    }

    pub fn goal(&self, id: Uuid) -> Option<&Goal> {
        self.behavioral_goals.iter().find(|g| g.id == id)
    }

    pub fn timer(&self, id: Uuid) -> Option<&ActivityTimer> {
        self.active_timers.iter().find(|t| t.id == id)
    }

    pub fn timer_mut(&mut self, id: Uuid) -> Option<&mut ActivityTimer> {
        self.active_timers.iter_mut().find(|t| t.id == id)
    }

    /// Timestamp of the most recent action of the given click type.
    pub fn last_timestamp_of(&self, click: ClickType) -> Option<i64> {
        self.action
            .iter()
            .filter(|a| a.click_type() == click)
            .map(|a| a.timestamp)
            .max()
    }

    pub fn push_notification(&mut self, now: i64, kind: NotificationKind, message: &str) {
        self.notifications.push(Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.to_string(),
            created_at: now,
            read: false,
        });
    }
}

/// One ledger entry. Immutable once appended, except the status-bearing
/// fields of a wait; removable only by popping the tail (undo last).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// When the real-world event occurred (epoch seconds, string-encoded on
    /// the wire). May be backdated by the user.
    #[serde(with = "ts_string")]
    pub timestamp: i64,
    /// When the record was written (epoch seconds). Always "now".
    pub click_stamp: i64,
    #[serde(flatten)]
    pub kind: ActionKind,
}

impl Action {
    pub fn new(timestamp: i64, click_stamp: i64, kind: ActionKind) -> Self {
        Self {
            timestamp,
            click_stamp,
            kind,
        }
    }

    pub fn click_type(&self) -> ClickType {
        match self.kind {
            ActionKind::Used => ClickType::Used,
            ActionKind::Craved => ClickType::Craved,
            ActionKind::Bought(_) => ClickType::Bought,
            ActionKind::Wait(_) => ClickType::Wait,
            ActionKind::Mood(_) => ClickType::Mood,
            ActionKind::Timed(_) => ClickType::Timed,
        }
    }

    pub fn wait(&self) -> Option<&WaitData> {
        match &self.kind {
            ActionKind::Wait(w) => Some(w),
            _ => None,
        }
    }

    pub fn wait_mut(&mut self) -> Option<&mut WaitData> {
        match &mut self.kind {
            ActionKind::Wait(w) => Some(w),
            _ => None,
        }
    }

    pub fn is_active_wait(&self) -> bool {
        self.wait().map(|w| w.status == WaitStatus::Active) == Some(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickType {
    Used,
    Craved,
    Bought,
    Wait,
    Mood,
    Timed,
}

/// Type-specific payload, discriminated by `clickType` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "clickType", rename_all = "lowercase")]
pub enum ActionKind {
    Used,
    Craved,
    Bought(BoughtData),
    Wait(WaitData),
    Mood(MoodData),
    Timed(TimedData),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BoughtData {
    /// Amount spent, decimal string as entered.
    pub spent: String,
}

impl BoughtData {
    /// Numeric value of `spent`; malformed input counts as zero.
    pub fn spent_value(&self) -> f64 {
        match self.spent.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                log::warn!("unparseable spent amount {:?}, counting as 0", self.spent);
                0.0
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaitData {
    /// Target end timestamp (epoch seconds).
    #[serde(alias = "goalStamp")]
    pub wait_stamp: i64,
    #[serde(alias = "goalType")]
    pub wait_type: WaitType,
    pub status: WaitStatus,
    /// Actual end timestamp; `WAIT_STOPPED_ACTIVE` while active.
    #[serde(alias = "goalStopped", default = "default_wait_stopped")]
    pub wait_stopped: i64,
}

fn default_wait_stopped() -> i64 {
    WAIT_STOPPED_ACTIVE
}

/// Which action types break this wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitType {
    Use,
    Bought,
    Both,
}

impl WaitType {
    pub fn covers_use(self) -> bool {
        matches!(self, WaitType::Use | WaitType::Both)
    }

    pub fn covers_bought(self) -> bool {
        matches!(self, WaitType::Bought | WaitType::Both)
    }
}

/// Wait lifecycle status. Stored as 1/2/3 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum WaitStatus {
    Active,
    EndedEarly,
    Completed,
}

impl From<WaitStatus> for u8 {
    fn from(s: WaitStatus) -> u8 {
        match s {
            WaitStatus::Active => 1,
            WaitStatus::EndedEarly => 2,
            WaitStatus::Completed => 3,
        }
    }
}

impl TryFrom<u8> for WaitStatus {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(WaitStatus::Active),
            2 => Ok(WaitStatus::EndedEarly),
            3 => Ok(WaitStatus::Completed),
            other => Err(format!("invalid wait status {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodData {
    #[serde(default)]
    pub comment: String,
    /// 0 (worst) .. 4 (best).
    pub smiley: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavioral_goal_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimedData {
    /// Logged duration in seconds.
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Onboarding aggregate. Opaque to the core; defaulted by migration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Baseline {
    #[serde(default)]
    pub habit_name: String,
    #[serde(default)]
    pub uses_per_day: f64,
    /// Decimal string as entered.
    #[serde(default)]
    pub cost_per_day: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<i64>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            habit_name: String::new(),
            uses_per_day: 0.0,
            cost_per_day: "0".to_string(),
            recorded_at: None,
        }
    }
}

/// User preferences and routing flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// A `use`-covering wait is currently active; the next did-it action
    /// must resolve it.
    #[serde(default, alias = "activeGoalUse")]
    pub active_wait_use: bool,
    /// A `bought`-covering wait is currently active.
    #[serde(default, alias = "activeGoalBought")]
    pub active_wait_bought: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Options {
    fn default() -> Self {
        Self {
            active_wait_use: false,
            active_wait_bought: false,
            notifications_enabled: true,
        }
    }
}

/// Rolling aggregates updated on terminal wait transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default, alias = "longestGoal")]
    pub longest_wait: LongestWait,
    #[serde(default)]
    pub waits_completed: u32,
}

/// Longest held wait in seconds, per time bucket. Buckets are keyed by the
/// wait's start timestamp against the current week/month/year.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LongestWait {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub week: i64,
    #[serde(default)]
    pub month: i64,
    #[serde(default)]
    pub year: i64,
}

/// A longer-horizon behavioral goal with a milestone pacing schedule.
/// Progress is always recomputed from the ledger, never cached here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub unit: GoalUnit,
    pub goal_amount: f64,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
    /// Days from creation to the deadline.
    pub completion_timeline: i64,
    pub curve_type: CurveType,
    #[serde(default)]
    pub status: GoalStatus,
}

impl Goal {
    /// Deadline in epoch milliseconds.
    pub fn deadline_ms(&self) -> i64 {
        self.created_at + self.completion_timeline * 86_400_000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    Quantifiable,
    Qualitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalUnit {
    Times,
    Minutes,
    Dollars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// Checkpoints squeeze toward the deadline; do-less pacing.
    Power,
    /// S-shaped cadence; do-more pacing.
    Sigmoid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Abandoned,
}

/// A running or paused activity timer. Not an action until stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTimer {
    pub id: Uuid,
    /// Re-anchored to "now" on every resume (epoch seconds).
    pub started_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<i64>,
    /// Running time folded in on each pause. Together with `started_at` and
    /// `status` this fully determines elapsed time at any instant.
    #[serde(default)]
    pub accumulated_seconds: i64,
    pub status: TimerStatus,
    #[serde(default)]
    pub long_running_notified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    /// Epoch seconds.
    pub created_at: i64,
    #[serde(default)]
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WaitCompleted,
    WaitNeedsReconciliation,
    GoalCompleted,
    ForgottenTimer,
}

/// Epoch seconds carried as a JSON string (historical wire format); numeric
/// input is accepted for tolerance.
pub(crate) mod ts_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(v)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Num(i64),
            Text(String),
        }

        match Raw::deserialize(d)? {
            Raw::Num(n) => Ok(n),
            Raw::Text(t) => t.trim().parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_with_string_timestamp() {
        let action = Action::new(
            1_700_000_000,
            1_700_000_100,
            ActionKind::Bought(BoughtData {
                spent: "12.50".to_string(),
            }),
        );

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["timestamp"], "1700000000");
        assert_eq!(json["clickType"], "bought");
        assert_eq!(json["spent"], "12.50");

        let back: Action = serde_json::from_value(json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn wait_status_wire_values() {
        let wait = ActionKind::Wait(WaitData {
            wait_stamp: 2_000,
            wait_type: WaitType::Use,
            status: WaitStatus::Active,
            wait_stopped: WAIT_STOPPED_ACTIVE,
        });
        let json = serde_json::to_value(Action::new(1_000, 1_000, wait)).unwrap();
        assert_eq!(json["status"], 1);
        assert_eq!(json["waitStopped"], -1);
        assert_eq!(json["waitType"], "use");
    }

    #[test]
    fn legacy_goal_field_names_accepted() {
        let json = serde_json::json!({
            "timestamp": "1000",
            "clickStamp": 1000,
            "clickType": "wait",
            "goalStamp": 5000,
            "goalType": "both",
            "status": 2,
            "goalStopped": 3000,
        });
        let action: Action = serde_json::from_value(json).unwrap();
        let wait = action.wait().unwrap();
        assert_eq!(wait.wait_stamp, 5000);
        assert_eq!(wait.wait_type, WaitType::Both);
        assert_eq!(wait.status, WaitStatus::EndedEarly);
        assert_eq!(wait.wait_stopped, 3000);
    }

    #[test]
    fn document_round_trip_is_structurally_equal() {
        let mut doc = Document::default();
        doc.action.push(Action::new(10, 10, ActionKind::Used));
        doc.action.push(Action::new(
            20,
            25,
            ActionKind::Mood(MoodData {
                comment: "ok".to_string(),
                smiley: 3,
                behavioral_goal_id: None,
            }),
        ));
        doc.statistics.longest_wait.total = 3600;

        let json = serde_json::to_string(&doc).unwrap();
        let back: Document = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn sorted_actions_orders_by_timestamp_not_append_order() {
        let mut doc = Document::default();
        doc.action.push(Action::new(300, 300, ActionKind::Used));
        // Backdated entry appended later.
        doc.action.push(Action::new(100, 400, ActionKind::Craved));

        let sorted = doc.sorted_actions();
        assert_eq!(sorted[0].timestamp, 100);
        assert_eq!(sorted[1].timestamp, 300);
    }
}
