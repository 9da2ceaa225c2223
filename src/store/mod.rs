//! Persistence layer — LIMS reader and milestone counter store.

pub mod lims;
pub mod migrations;
pub mod milestone_db;
pub mod traits;

pub use lims::LimsDatabase;
pub use milestone_db::LibSqlCounterStore;
pub use traits::{CounterStore, ProductionMetrics, TaskRepository};
