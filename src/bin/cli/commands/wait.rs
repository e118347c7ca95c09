use clap::Subcommand;

use holdout::store::models::WaitType;
use holdout::waits::WaitState;
use holdout::App;

use crate::render::{format_parts, print_json, OutputFormat};

#[derive(Subcommand)]
pub enum WaitCommand {
    /// Start a wait commitment ending at the given time
    Start {
        /// Deadline (epoch seconds)
        deadline: i64,
        /// Which actions break the wait
        #[arg(long, value_enum, default_value = "use")]
        kind: WaitKind,
    },
    /// Push the deadline of the active wait later
    Extend {
        /// New deadline (epoch seconds); must be later than the current one
        deadline: i64,
    },
    /// Give up on the active wait now
    End,
    /// Answer the "did you make it?" prompt for a wait that expired while
    /// the app was closed
    Resolve {
        /// The wait was held all the way to its deadline
        #[arg(long, conflicts_with = "broke_at")]
        made_it: bool,
        /// When the wait was actually broken (epoch seconds, within the
        /// wait's original window)
        #[arg(long)]
        broke_at: Option<i64>,
    },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum WaitKind {
    Use,
    Bought,
    Both,
}

impl From<WaitKind> for WaitType {
    fn from(kind: WaitKind) -> Self {
        match kind {
            WaitKind::Use => WaitType::Use,
            WaitKind::Bought => WaitType::Bought,
            WaitKind::Both => WaitType::Both,
        }
    }
}

pub fn run(app: &mut App, cmd: WaitCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        WaitCommand::Start { deadline, kind } => {
            app.create_wait(deadline, kind.into())?;
        }
        WaitCommand::Extend { deadline } => {
            app.extend_wait(deadline)?;
        }
        WaitCommand::End => {
            if !app.end_wait_early()? {
                println!("no active wait");
                return Ok(());
            }
        }
        WaitCommand::Resolve { made_it, broke_at } => {
            if !app.resolve_expired_wait(made_it, broke_at)? {
                println!("no wait needs reconciliation");
                return Ok(());
            }
        }
    }

    let state = app.wait_state();
    match format {
        OutputFormat::Json => print_json(&state)?,
        OutputFormat::Plain => match state {
            WaitState::None => println!("no active wait"),
            WaitState::Active { .. } => {
                let parts = app.wait_countdown().expect("active wait has a countdown");
                println!("waiting, {} remaining", format_parts(&parts));
            }
            WaitState::NeedsReconciliation { deadline, .. } => {
                println!(
                    "wait expired at {} while away; run `wait resolve`",
                    deadline
                );
            }
        },
    }
    Ok(())
}
