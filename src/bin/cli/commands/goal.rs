use clap::Subcommand;
use uuid::Uuid;

use holdout::milestones::MilestoneStatus;
use holdout::store::models::{CurveType, GoalType, GoalUnit};
use holdout::App;

use crate::render::{print_json, OutputFormat};

#[derive(Subcommand)]
pub enum GoalCommand {
    /// Create a behavioral goal with a milestone pacing schedule
    Add {
        /// Target quantity
        amount: f64,
        /// Days until the deadline
        #[arg(long, default_value_t = 30)]
        days: i64,
        #[arg(long, value_enum, default_value = "times")]
        unit: Unit,
        /// Pacing curve: power paces a do-less habit, sigmoid a do-more one
        #[arg(long, value_enum, default_value = "sigmoid")]
        curve: Curve,
        /// Track without a quantified schedule
        #[arg(long)]
        qualitative: bool,
    },
    /// List goals
    List,
    /// Show the reconciled milestone schedule for a goal
    Milestones { id: Uuid },
    /// Give up on a goal
    Abandon { id: Uuid },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Unit {
    Times,
    Minutes,
    Dollars,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum Curve {
    Power,
    Sigmoid,
}

pub fn run(app: &mut App, cmd: GoalCommand, format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        GoalCommand::Add {
            amount,
            days,
            unit,
            curve,
            qualitative,
        } => {
            let goal_type = if qualitative {
                GoalType::Qualitative
            } else {
                GoalType::Quantifiable
            };
            let unit = match unit {
                Unit::Times => GoalUnit::Times,
                Unit::Minutes => GoalUnit::Minutes,
                Unit::Dollars => GoalUnit::Dollars,
            };
            let curve = match curve {
                Curve::Power => CurveType::Power,
                Curve::Sigmoid => CurveType::Sigmoid,
            };
            let id = app.create_goal(goal_type, unit, amount, days, curve)?;
            match format {
                OutputFormat::Plain => println!("created goal {}", id),
                OutputFormat::Json => print_json(&serde_json::json!({ "created": id }))?,
            }
        }
        GoalCommand::List => match format {
            OutputFormat::Json => print_json(&app.goals())?,
            OutputFormat::Plain => {
                if app.goals().is_empty() {
                    println!("no goals");
                }
                for goal in app.goals() {
                    println!(
                        "{}  {:?} {} {:?} over {} days  [{:?}]",
                        goal.id,
                        goal.curve_type,
                        goal.goal_amount,
                        goal.unit,
                        goal.completion_timeline,
                        goal.status,
                    );
                }
            }
        },
        GoalCommand::Milestones { id } => {
            let milestones = app.goal_milestones(id)?;
            match format {
                OutputFormat::Json => print_json(&milestones)?,
                OutputFormat::Plain => {
                    for m in &milestones {
                        let mark = match m.status {
                            MilestoneStatus::Completed => "x",
                            MilestoneStatus::Missed => "!",
                            MilestoneStatus::Upcoming => " ",
                        };
                        println!("[{}] #{:<3} at {}", mark, m.index, m.timestamp);
                    }
                }
            }
        }
        GoalCommand::Abandon { id } => {
            let changed = app.abandon_goal(id)?;
            println!("{}", if changed { "abandoned" } else { "no such goal" });
        }
    }
    Ok(())
}
