//! Fire-and-forget user notification seam.
//!
//! The core reports events; whatever banner/log UI exists reacts on its own
//! schedule. Reconciliation answers come back later as ordinary commands,
//! never through this interface.

use crate::store::models::NotificationKind;

#[derive(Debug, Clone)]
pub struct NotifyEvent {
    pub kind: NotificationKind,
    pub message: String,
}

impl NotifyEvent {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send {
    fn notify(&self, event: &NotifyEvent);
}

/// Default collaborator: writes the event to the log and nothing else.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotifyEvent) {
        log::info!("notify [{:?}]: {}", event.kind, event.message);
    }
}

/// Swallows everything. Test fixture.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &NotifyEvent) {}
}
