//! The reconciliation and milestone pipelines: fetch, evaluate, notify.
//!
//! Both abort on the first error. Neither retries; the next scheduled run
//! is the retry.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::PipelineKind;
use crate::error::Result;
use crate::milestones::{Metric, MilestoneTracker};
use crate::notify::Notifier;
use crate::report::{format_milestone, format_missing};
use crate::store::{CounterStore, ProductionMetrics, TaskRepository};
use crate::tasks::{AnalysisUnit, find_missing};

/// Result of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub analyses_checked: usize,
    pub stitching_tasks: usize,
    /// Units lacking two stitched plates, in table order.
    pub missing: Vec<AnalysisUnit>,
    pub notified: bool,
}

/// A milestone that was crossed, announced, and advanced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneEvent {
    pub metric: Metric,
    pub threshold: u64,
    pub current: u64,
    pub next_threshold: u64,
}

/// Check every analysis has its stitched plates; alert if any do not.
pub async fn run_reconciliation<R, N>(
    repo: &R,
    notifier: &N,
    now: DateTime<Utc>,
) -> Result<ReconciliationReport>
where
    R: TaskRepository + ?Sized,
    N: Notifier + ?Sized,
{
    let units = repo.list_analysis_units().await?;
    let tasks = repo.list_support_tasks().await?;
    let missing = find_missing(&units, &tasks, now);

    let notified = if missing.is_empty() {
        info!(analyses = units.len(), "All analyses have stitched plates");
        false
    } else {
        let msg = format_missing(&missing);
        warn!(missing = missing.len(), "Analyses with missing stitched plates");
        notifier.notify(&msg).await?;
        true
    };

    Ok(ReconciliationReport {
        analyses_checked: units.len(),
        stitching_tasks: tasks.len(),
        missing: missing.into_iter().cloned().collect(),
        notified,
    })
}

/// Check each metric against its milestone; announce and advance crossings.
///
/// A counter is advanced only after its alert was delivered.
pub async fn run_milestones<M, S, N>(
    metrics: &M,
    store: &S,
    notifier: &N,
) -> Result<Vec<MilestoneEvent>>
where
    M: ProductionMetrics + ?Sized,
    S: CounterStore + ?Sized,
    N: Notifier + ?Sized,
{
    let tracker = MilestoneTracker::new(store);
    let mut events = Vec::new();

    for metric in Metric::ALL {
        let current = metrics.current_value(metric).await?;
        let check = tracker.is_milestone(metric, current).await?;
        if !check.crossed {
            continue;
        }

        let msg = format_milestone(metric, check.threshold, current);
        info!(metric = %metric, threshold = check.threshold, current, "{msg}");
        notifier.notify(&msg).await?;
        let next_threshold = tracker.advance(metric).await?;

        events.push(MilestoneEvent {
            metric,
            threshold: check.threshold,
            current,
            next_threshold,
        });
    }
    Ok(events)
}

/// Outcome of [`run_once`].
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reconciliation: Option<ReconciliationReport>,
    pub milestones: Option<Vec<MilestoneEvent>>,
}

/// Run the selected pipelines in order, stopping at the first error.
pub async fn run_once<L, S, N>(
    lims: &L,
    store: &S,
    notifier: &N,
    pipelines: &[PipelineKind],
) -> Result<RunSummary>
where
    L: TaskRepository + ProductionMetrics + ?Sized,
    S: CounterStore + ?Sized,
    N: Notifier + ?Sized,
{
    let mut summary = RunSummary::default();
    if pipelines.contains(&PipelineKind::Reconcile) {
        summary.reconciliation = Some(run_reconciliation(lims, notifier, Utc::now()).await?);
    }
    if pipelines.contains(&PipelineKind::Milestones) {
        summary.milestones = Some(run_milestones(lims, store, notifier).await?);
    }
    Ok(summary)
}
