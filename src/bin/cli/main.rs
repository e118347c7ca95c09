mod commands;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use holdout::{App, LedgerStore, LogNotifier, SystemClock};

use render::OutputFormat;

#[derive(Parser)]
#[command(name = "holdout-cli", about = "Habit and impulse tracker", version)]
struct Cli {
    /// Use a specific ledger file (default: platform data dir)
    #[arg(long, global = true)]
    ledger: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current wait, timers and unread notifications
    Status,

    /// Record an action in the ledger
    #[command(subcommand)]
    Log(commands::log::LogCommand),

    /// Remove the most recently recorded action
    Undo,

    /// Manage the wait commitment
    #[command(subcommand)]
    Wait(commands::wait::WaitCommand),

    /// Manage activity timers
    #[command(subcommand)]
    Timer(commands::timer::TimerCommand),

    /// Manage behavioral goals and their milestone schedules
    #[command(subcommand)]
    Goal(commands::goal::GoalCommand),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let store = match cli.ledger {
        Some(path) => LedgerStore::new(path),
        None => LedgerStore::open_default()?,
    };
    let mut app = App::open(store, Arc::new(SystemClock), Box::new(LogNotifier))?;

    // Catch up on anything that happened since the last run (a wait that
    // completed between invocations, a timer left going for a day).
    app.tick()?;

    match cli.command {
        Command::Status => commands::status::run(&app, cli.format),
        Command::Log(cmd) => commands::log::run(&mut app, cmd, cli.format),
        Command::Undo => commands::log::undo(&mut app, cli.format),
        Command::Wait(cmd) => commands::wait::run(&mut app, cmd, cli.format),
        Command::Timer(cmd) => commands::timer::run(&mut app, cmd, cli.format),
        Command::Goal(cmd) => commands::goal::run(&mut app, cmd, cli.format),
    }
}
