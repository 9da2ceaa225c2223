//! Analysis/stitching task model and reconciliation.

pub mod matcher;
pub mod model;
pub mod source_name;

pub use matcher::{REQUIRED_SUPPORT, find_missing, has_support};
pub use model::{AnalysisUnit, SupportRecord, SupportStatus, SupportTask};
pub use source_name::{derive_workflow_id, variant_code};
