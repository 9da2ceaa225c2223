use anyhow::Context;
use chrono::Utc;

use stitch_watch::config::WatchConfig;
use stitch_watch::notify::SlackWebhook;
use stitch_watch::pipeline::{self, RunSummary};
use stitch_watch::store::{LibSqlCounterStore, LimsDatabase};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        tracing::error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = WatchConfig::from_env().context("reading configuration")?;

    // ── Counter store ───────────────────────────────────────────────────
    let store = if config.create_counters {
        LibSqlCounterStore::create(&config.milestone_db_path).await
    } else {
        LibSqlCounterStore::open_existing(&config.milestone_db_path).await
    }
    .context("opening milestone database")?;

    // ── LIMS ────────────────────────────────────────────────────────────
    let options = config.lims.connect_options()?;
    let lims = LimsDatabase::connect(options)
        .await
        .context("connecting to LIMS")?;

    // ── Notifier ────────────────────────────────────────────────────────
    let notifier = SlackWebhook::new(config.webhook_url);

    let Some(schedule) = config.schedule.as_ref() else {
        let summary = pipeline::run_once(&lims, &store, &notifier, &config.pipelines).await?;
        log_summary(&summary);
        return Ok(());
    };

    tracing::info!(schedule = %schedule, "Running on schedule");
    loop {
        let Some(next) = schedule.upcoming(Utc).next() else {
            tracing::info!("Schedule has no further fire times");
            return Ok(());
        };
        let wait = (next - Utc::now()).to_std().unwrap_or_default();
        tracing::debug!(next = %next, "Sleeping until next run");
        tokio::time::sleep(wait).await;

        let summary = pipeline::run_once(&lims, &store, &notifier, &config.pipelines).await?;
        log_summary(&summary);
    }
}

fn log_summary(summary: &RunSummary) {
    if let Some(ref report) = summary.reconciliation {
        tracing::info!(
            analyses = report.analyses_checked,
            stitching_tasks = report.stitching_tasks,
            missing = report.missing.len(),
            notified = report.notified,
            "Reconciliation finished"
        );
    }
    if let Some(ref events) = summary.milestones {
        tracing::info!(milestones = events.len(), "Milestone check finished");
    }
}
