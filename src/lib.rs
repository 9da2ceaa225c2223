//! Stitch Watch — reconciles stitching against analysis tasks in the LIMS
//! and announces production milestones.

pub mod config;
pub mod error;
pub mod milestones;
pub mod notify;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod tasks;
