use clap::Subcommand;
use uuid::Uuid;

use holdout::App;

use crate::render::{print_json, OutputFormat};

#[derive(Subcommand)]
pub enum LogCommand {
    /// Record a did-it event
    Used {
        /// Backdate the event (epoch seconds)
        #[arg(long)]
        at: Option<i64>,
    },
    /// Record a resisted craving
    Craved {
        #[arg(long)]
        at: Option<i64>,
    },
    /// Record money spent
    Bought {
        /// Amount spent, e.g. "12.50"
        spent: String,
        #[arg(long)]
        at: Option<i64>,
    },
    /// Record a mood check-in
    Mood {
        /// 0 (worst) .. 4 (best)
        smiley: u8,
        #[arg(long, default_value = "")]
        comment: String,
        /// Attach to a behavioral goal
        #[arg(long)]
        goal: Option<Uuid>,
    },
    /// Record a timed activity directly
    Timed {
        /// Duration in seconds
        duration: i64,
        #[arg(long)]
        amount: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long)]
        at: Option<i64>,
    },
}

pub fn run(app: &mut App, cmd: LogCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        LogCommand::Used { at } => app.log_used(at)?,
        LogCommand::Craved { at } => app.log_craved(at)?,
        LogCommand::Bought { spent, at } => app.log_bought(spent, at)?,
        LogCommand::Mood {
            smiley,
            comment,
            goal,
        } => app.log_mood(comment, smiley, goal)?,
        LogCommand::Timed {
            duration,
            amount,
            unit,
            at,
        } => app.log_timed(duration, amount, unit, at)?,
    }

    match format {
        OutputFormat::Plain => println!("logged"),
        OutputFormat::Json => print_json(&serde_json::json!({ "logged": true }))?,
    }
    Ok(())
}

pub fn undo(app: &mut App, format: OutputFormat) -> anyhow::Result<()> {
    let undone = app.undo_last()?;
    match format {
        OutputFormat::Plain => match undone {
            Some(click) => println!("removed last action ({:?})", click),
            None => println!("nothing to undo"),
        },
        OutputFormat::Json => print_json(&serde_json::json!({ "undone": undone }))?,
    }
    Ok(())
}
