use holdout::store::models::ClickType;
use holdout::waits::WaitState;
use holdout::App;

use crate::render::{format_parts, print_json, OutputFormat};

pub fn run(app: &App, format: OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(&serde_json::json!({
            "wait": app.wait_state(),
            "sinceLastUse": app.time_since_last(ClickType::Used),
            "activeTimers": app.active_timers(),
            "unreadNotifications": app.unread_notifications(),
        }));
    }

    match app.wait_state() {
        WaitState::None => println!("no active wait"),
        WaitState::Active { .. } => {
            let parts = app.wait_countdown().expect("active wait has a countdown");
            println!("waiting, {} remaining", format_parts(&parts));
        }
        WaitState::NeedsReconciliation { deadline, .. } => {
            println!("wait expired at {} while away; run `wait resolve`", deadline);
        }
    }

    match app.time_since_last(ClickType::Used) {
        Some(parts) => println!("since last use: {}", format_parts(&parts)),
        None => println!("no uses logged"),
    }

    let timers = app.active_timers();
    if !timers.is_empty() {
        println!("{} activity timer(s) running", timers.len());
    }

    for n in app.unread_notifications() {
        println!("! {}", n.message);
    }
    Ok(())
}
