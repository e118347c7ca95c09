use clap::Subcommand;
use uuid::Uuid;

use holdout::timers;
use holdout::App;

use crate::render::{format_parts, print_json, OutputFormat};

#[derive(Subcommand)]
pub enum TimerCommand {
    /// Start a new activity timer
    Start,
    /// Pause a running timer
    Pause { id: Uuid },
    /// Resume a paused timer
    Resume { id: Uuid },
    /// Stop a timer and log it as a timed action
    Stop {
        id: Uuid,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
    },
    /// Drop a timer without logging anything
    Discard { id: Uuid },
    /// List active timers with their reconstructed elapsed time
    List,
}

pub fn run(app: &mut App, cmd: TimerCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TimerCommand::Start => {
            let id = app.start_activity_timer()?;
            match format {
                OutputFormat::Plain => println!("started timer {}", id),
                OutputFormat::Json => print_json(&serde_json::json!({ "started": id }))?,
            }
        }
        TimerCommand::Pause { id } => {
            let paused = app.pause_activity_timer(id)?;
            println!("{}", if paused { "paused" } else { "nothing to pause" });
        }
        TimerCommand::Resume { id } => {
            let resumed = app.resume_activity_timer(id)?;
            println!("{}", if resumed { "resumed" } else { "nothing to resume" });
        }
        TimerCommand::Stop { id, amount, unit } => match app.stop_activity_timer(id, amount, unit)? {
            Some(duration) => {
                let parts = timers::decompose(duration);
                match format {
                    OutputFormat::Plain => println!("logged {}", format_parts(&parts)),
                    OutputFormat::Json => print_json(&parts)?,
                }
            }
            None => println!("no such timer"),
        },
        TimerCommand::Discard { id } => {
            let dropped = app.discard_activity_timer(id)?;
            println!("{}", if dropped { "discarded" } else { "no such timer" });
        }
        TimerCommand::List => {
            let views: Vec<_> = app
                .active_timers()
                .iter()
                .map(|t| (t.clone(), app.timer_elapsed(t.id).expect("timer exists")))
                .collect();
            match format {
                OutputFormat::Json => print_json(&views)?,
                OutputFormat::Plain => {
                    if views.is_empty() {
                        println!("no active timers");
                    }
                    for (timer, parts) in views {
                        println!(
                            "{}  {:?}  {}",
                            timer.id,
                            timer.status,
                            format_parts(&parts)
                        );
                    }
                }
            }
        }
    }
    Ok(())
}
