//! Repository traits — the data the pipelines read and the state they keep.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{DatabaseError, Error, LookupError};
use crate::milestones::{Metric, MilestoneCounter};
use crate::tasks::{AnalysisUnit, SupportRecord, SupportTask, variant_code};

/// Read-only access to the LIMS task tracking tables.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// All analysis units, in table order.
    async fn list_analysis_units(&self) -> Result<Vec<AnalysisUnit>, Error>;

    /// All stitching tasks as stored, before derivation.
    async fn list_support_records(&self) -> Result<Vec<SupportRecord>, Error>;

    /// Variant name for a plate code, `None` if the strain table has no match.
    async fn lookup_variant(&self, code: &str) -> Result<Option<String>, DatabaseError>;

    /// Resolve the variant of a plate name via the strain table.
    async fn derive_variant(&self, source_name: &str) -> Result<String, Error> {
        let code = variant_code(source_name)?;
        match self.lookup_variant(&code).await? {
            Some(variant) => Ok(variant),
            None => Err(LookupError::VariantNotFound { code }.into()),
        }
    }

    /// All stitching tasks with `workflow_id` and `variant` derived.
    ///
    /// Variant lookups are made once per plate code. Any malformed name or
    /// unknown code fails the whole fetch.
    async fn list_support_tasks(&self) -> Result<Vec<SupportTask>, Error> {
        let records = self.list_support_records().await?;
        let mut variants: HashMap<String, String> = HashMap::new();
        let mut tasks = Vec::with_capacity(records.len());

        for record in records {
            let code = variant_code(&record.source_name)?;
            let variant = match variants.get(&code) {
                Some(v) => v.clone(),
                None => {
                    let v = self.derive_variant(&record.source_name).await?;
                    variants.insert(code, v.clone());
                    v
                }
            };
            debug!(plate = %record.source_name, variant = %variant, "Resolved stitching task");
            tasks.push(SupportTask::from_record(record, variant)?);
        }
        Ok(tasks)
    }
}

/// Current values of the cumulative production metrics.
#[async_trait]
pub trait ProductionMetrics: Send + Sync {
    async fn current_value(&self, metric: Metric) -> Result<u64, Error>;
}

/// Persistent milestone counters.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a counter; `DatabaseError::NotFound` for an unknown name.
    async fn get_counter(&self, name: &str) -> Result<MilestoneCounter, DatabaseError>;

    /// Overwrite a counter's interval.
    async fn set_interval(&self, name: &str, interval: u64) -> Result<(), DatabaseError>;
}
