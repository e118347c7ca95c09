pub mod app;
pub mod clock;
pub mod error;
pub mod milestones;
pub mod notify;
pub mod store;
pub mod timers;
pub mod waits;

pub use app::App;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{HoldoutError, Result};
pub use notify::{LogNotifier, Notifier, NotifyEvent};
pub use store::LedgerStore;
