//! Output helpers shared by the subcommands.

use holdout::timers::TimeParts;

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn format_parts(parts: &TimeParts) -> String {
    if parts.days > 0 {
        format!(
            "{}d {:02}:{:02}:{:02}",
            parts.days, parts.hours, parts.minutes, parts.seconds
        )
    } else {
        format!("{:02}:{:02}:{:02}", parts.hours, parts.minutes, parts.seconds)
    }
}
