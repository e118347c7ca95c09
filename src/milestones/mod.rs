pub mod curve;
pub mod schedule;

pub use curve::{generate, time_fraction, Checkpoint};
pub use schedule::{amount_before, milestones, remaining_needed, Milestone, MilestoneStatus};
