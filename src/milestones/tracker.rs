//! Threshold evaluation over the counter store.

use tracing::info;

use super::model::Metric;
use crate::error::DatabaseError;
use crate::store::CounterStore;

/// Outcome of checking a metric against its current milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneCheck {
    pub crossed: bool,
    pub threshold: u64,
}

/// Reads and advances milestone counters in a [`CounterStore`].
pub struct MilestoneTracker<'a, S: CounterStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CounterStore + ?Sized> MilestoneTracker<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Whether `current` is strictly above the metric's current threshold.
    ///
    /// Read-only; the counter is not touched.
    pub async fn is_milestone(
        &self,
        metric: Metric,
        current: u64,
    ) -> Result<MilestoneCheck, DatabaseError> {
        let counter = self.store.get_counter(metric.as_str()).await?;
        let threshold = counter.threshold();
        Ok(MilestoneCheck {
            crossed: current > threshold,
            threshold,
        })
    }

    /// Move the metric to its next milestone and return the new threshold.
    ///
    /// Call once per delivered notification: each call advances again.
    pub async fn advance(&self, metric: Metric) -> Result<u64, DatabaseError> {
        let name = metric.as_str();
        let counter = self.store.get_counter(name).await?;
        self.store.set_interval(name, counter.interval + 1).await?;

        let updated = self.store.get_counter(name).await?;
        let threshold = updated.threshold();
        info!(metric = name, interval = updated.interval, threshold, "Updated milestone");
        Ok(threshold)
    }
}
