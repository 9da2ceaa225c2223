//! Milestone counters and threshold evaluation.

pub mod model;
pub mod tracker;

pub use model::{Metric, MilestoneCounter};
pub use tracker::{MilestoneCheck, MilestoneTracker};
