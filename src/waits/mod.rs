pub mod machine;

pub use machine::{
    complete_wait, create_wait, end_wait_early, extend_wait, needs_reconciliation,
    resolve_expired_wait, resolve_on_action,
};

use serde::Serialize;

use crate::store::models::{Document, WaitType};
use crate::timers;

/// Read-only view of the current wait commitment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum WaitState {
    None,
    Active {
        started_at: i64,
        deadline: i64,
        wait_type: WaitType,
        remaining_seconds: i64,
    },
    /// The deadline passed while the app was not running; the user must be
    /// asked whether they made it before anything else can happen to waits.
    NeedsReconciliation {
        started_at: i64,
        deadline: i64,
        wait_type: WaitType,
    },
}

pub fn wait_state(doc: &Document, now: i64) -> WaitState {
    let Some(action) = doc.active_wait() else {
        return WaitState::None;
    };
    let wait = action.wait().expect("active wait action has wait data");

    if wait.wait_stamp < now {
        WaitState::NeedsReconciliation {
            started_at: action.timestamp,
            deadline: wait.wait_stamp,
            wait_type: wait.wait_type,
        }
    } else {
        WaitState::Active {
            started_at: action.timestamp,
            deadline: wait.wait_stamp,
            wait_type: wait.wait_type,
            remaining_seconds: timers::remaining_seconds(wait.wait_stamp, now),
        }
    }
}
