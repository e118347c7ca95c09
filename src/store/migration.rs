//! Versioned schema migration for the persisted document.
//!
//! Runs once per load, on the raw JSON value, before the typed model sees
//! it. Gates form a linear chain: gate `n` runs only while `version < n`,
//! only defaults fields that are absent, and renames copy-first (the old
//! key is dropped only after the new one holds the value, so an interrupted
//! gate never loses data). Legacy spellings on unmigrated blobs are also
//! accepted as serde aliases by the typed model; that read-side shim and
//! these gates are the only places the old names exist. Running the chain
//! on a current document is a no-op; running it twice equals running it
//! once.

use serde_json::{json, Map, Value};

use super::models::CURRENT_VERSION;

/// Apply every pending gate in order. Malformed shapes are defaulted
/// best-effort, never rejected; corrupt state must not crash the app.
pub fn migrate(doc: &mut Value) {
    if !doc.is_object() {
        log::warn!("stored document is not an object, resetting to defaults");
        *doc = json!({ "version": 0 });
    }

    let from = version(doc);
    if from >= CURRENT_VERSION {
        return;
    }

    gate_2_core_aggregates(doc);
    gate_3_goal_to_wait_rename(doc);
    gate_4_goal_and_timer_arrays(doc);

    log::info!("migrated document from version {} to {}", from, version(doc));
}

fn version(doc: &Value) -> u32 {
    doc.get("version").and_then(Value::as_u64).unwrap_or(0) as u32
}

fn set_version(doc: &mut Value, v: u32) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("version".to_string(), json!(v));
    }
}

fn ensure_field(obj: &mut Map<String, Value>, key: &str, default: Value) {
    if !obj.contains_key(key) {
        obj.insert(key.to_string(), default);
    }
}

/// Copy `old` to `new` if `new` is absent, then drop `old`. The typed model
/// would reject a blob carrying both spellings of an aliased field.
fn copy_rename(obj: &mut Map<String, Value>, old: &str, new: &str) {
    if !obj.contains_key(new) {
        if let Some(v) = obj.get(old).cloned() {
            obj.insert(new.to_string(), v);
        }
    }
    obj.remove(old);
}

/// Gate 2: the baseline/option/statistics aggregates became mandatory, and
/// bought actions grew a `spent` field.
fn gate_2_core_aggregates(doc: &mut Value) {
    if version(doc) >= 2 {
        return;
    }

    if let Some(obj) = doc.as_object_mut() {
        ensure_field(obj, "action", json!([]));
        ensure_field(obj, "baseline", json!({}));
        ensure_field(obj, "option", json!({}));
        ensure_field(obj, "statistics", json!({}));

        if let Some(stats) = obj.get_mut("statistics").and_then(Value::as_object_mut) {
            ensure_field(stats, "waitsCompleted", json!(0));
        }

        if let Some(actions) = obj.get_mut("action").and_then(Value::as_array_mut) {
            for action in actions.iter_mut() {
                if let Some(a) = action.as_object_mut() {
                    if a.get("clickType").and_then(Value::as_str) == Some("bought") {
                        ensure_field(a, "spent", json!("0"));
                    }
                }
            }
        }
    }

    set_version(doc, 2);
}

/// Gate 3: `goal*` became `wait*` (actions) and `activeGoal*` became
/// `activeWait*` (options). Copy-then-rename.
fn gate_3_goal_to_wait_rename(doc: &mut Value) {
    if version(doc) >= 3 {
        return;
    }

    if let Some(actions) = doc.get_mut("action").and_then(Value::as_array_mut) {
        for action in actions.iter_mut() {
            if let Some(a) = action.as_object_mut() {
                if a.get("clickType").and_then(Value::as_str) == Some("goal") {
                    a.insert("clickType".to_string(), json!("wait"));
                }
                if a.get("clickType").and_then(Value::as_str) == Some("wait") {
                    copy_rename(a, "goalStamp", "waitStamp");
                    copy_rename(a, "goalType", "waitType");
                    copy_rename(a, "goalStopped", "waitStopped");
                    ensure_field(a, "status", json!(1));
                    ensure_field(a, "waitStopped", json!(-1));
                }
            }
        }
    }

    if let Some(option) = doc.get_mut("option").and_then(Value::as_object_mut) {
        copy_rename(option, "activeGoalUse", "activeWaitUse");
        copy_rename(option, "activeGoalBought", "activeWaitBought");
    }

    if let Some(stats) = doc.get_mut("statistics").and_then(Value::as_object_mut) {
        copy_rename(stats, "longestGoal", "longestWait");
        ensure_field(stats, "longestWait", json!({}));
    }

    set_version(doc, 3);
}

/// Gate 4: behavioral goals, activity timers and the notification log.
fn gate_4_goal_and_timer_arrays(doc: &mut Value) {
    if version(doc) >= 4 {
        return;
    }

    if let Some(obj) = doc.as_object_mut() {
        ensure_field(obj, "behavioralGoals", json!([]));
        ensure_field(obj, "activeTimers", json!([]));
        ensure_field(obj, "notifications", json!([]));
    }

    set_version(doc, 4);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::models::{Document, WaitStatus, WaitType};

    fn legacy_v1() -> Value {
        json!({
            "version": 1,
            "action": [
                { "timestamp": "100", "clickStamp": 100, "clickType": "used" },
                { "timestamp": "200", "clickStamp": 200, "clickType": "bought" },
                {
                    "timestamp": "300",
                    "clickStamp": 300,
                    "clickType": "goal",
                    "goalStamp": 4000,
                    "goalType": "use",
                    "status": 2,
                    "goalStopped": 3500,
                },
            ],
            "option": { "activeGoalUse": true },
        })
    }

    #[test]
    fn migrates_legacy_document_to_current() {
        let mut doc = legacy_v1();
        migrate(&mut doc);

        assert_eq!(doc["version"], CURRENT_VERSION);
        assert_eq!(doc["action"][1]["spent"], "0");
        assert_eq!(doc["action"][2]["clickType"], "wait");
        assert_eq!(doc["action"][2]["waitStamp"], 4000);
        // Old spelling dropped once the canonical name holds the value.
        assert!(doc["action"][2].get("goalStamp").is_none());
        assert_eq!(doc["option"]["activeWaitUse"], true);
        assert_eq!(doc["behavioralGoals"], json!([]));

        let typed: Document = serde_json::from_value(doc).unwrap();
        let wait = typed.action[2].wait().unwrap();
        assert_eq!(wait.wait_stamp, 4000);
        assert_eq!(wait.wait_type, WaitType::Use);
        assert_eq!(wait.status, WaitStatus::EndedEarly);
        assert!(typed.option.active_wait_use);
    }

    #[test]
    fn migration_is_idempotent() {
        let mut once = legacy_v1();
        migrate(&mut once);
        let mut twice = once.clone();
        migrate(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn current_document_is_untouched() {
        let doc = Document::default();
        let mut value = serde_json::to_value(&doc).unwrap();
        let before = value.clone();
        migrate(&mut value);
        assert_eq!(value, before);
    }

    #[test]
    fn malformed_blob_degrades_to_defaults() {
        let mut doc = json!("not an object");
        migrate(&mut doc);
        assert_eq!(doc["version"], CURRENT_VERSION);
        let typed: Document = serde_json::from_value(doc).unwrap();
        assert!(typed.action.is_empty());
    }

    #[test]
    fn gate_runs_only_below_its_version() {
        // A v3 document with an unmigrated-looking action must not be touched
        // by gate 3 again.
        let mut doc = json!({
            "version": 3,
            "action": [],
            "option": {},
            "statistics": {},
        });
        migrate(&mut doc);
        assert_eq!(doc["version"], CURRENT_VERSION);
        assert!(doc.get("option").unwrap().get("activeWaitUse").is_none());
    }
}
