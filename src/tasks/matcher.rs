//! Reconcile analysis units against stitching tasks.

use chrono::{DateTime, Utc};
use tracing::debug;

use super::model::{AnalysisUnit, SupportTask};

/// Stitched plates each analysis needs (one per imaging channel).
pub const REQUIRED_SUPPORT: usize = 2;

/// Whether `unit` has two matching tasks that are new or successful.
///
/// Stops scanning as soon as the second one is found.
pub fn has_support(unit: &AnalysisUnit, tasks: &[SupportTask], now: DateTime<Utc>) -> bool {
    tasks
        .iter()
        .filter(|task| unit.matches(task) && task.status(now).is_countable())
        .take(REQUIRED_SUPPORT)
        .count()
        == REQUIRED_SUPPORT
}

/// Units lacking sufficient support, in input order.
pub fn find_missing<'a>(
    units: &'a [AnalysisUnit],
    tasks: &[SupportTask],
    now: DateTime<Utc>,
) -> Vec<&'a AnalysisUnit> {
    let missing: Vec<&AnalysisUnit> = units
        .iter()
        .filter(|unit| !has_support(unit, tasks, now))
        .collect();
    for unit in &missing {
        for task in tasks.iter().filter(|task| unit.matches(task)) {
            debug!(
                workflow_id = unit.workflow_id,
                plate = %task.source_name,
                status = %task.status(now),
                "Stitching task for unsupported analysis"
            );
        }
    }
    debug!(
        units = units.len(),
        tasks = tasks.len(),
        missing = missing.len(),
        "Reconciled analyses against stitching tasks"
    );
    missing
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn unit(workflow_id: i64, variant: &str, now: DateTime<Utc>) -> AnalysisUnit {
        AnalysisUnit {
            workflow_id,
            variant: variant.into(),
            created_at: now - TimeDelta::hours(3),
            finished_at: None,
        }
    }

    fn successful(workflow_id: i64, variant: &str, now: DateTime<Utc>) -> SupportTask {
        SupportTask {
            source_name: format!("S01{workflow_id:06}"),
            created_at: now - TimeDelta::hours(5),
            finished_at: Some(now - TimeDelta::hours(4)),
            workflow_id,
            variant: variant.into(),
        }
    }

    fn failed(workflow_id: i64, variant: &str, now: DateTime<Utc>) -> SupportTask {
        SupportTask {
            finished_at: None,
            ..successful(workflow_id, variant, now)
        }
    }

    fn in_flight(workflow_id: i64, variant: &str, now: DateTime<Utc>) -> SupportTask {
        SupportTask {
            created_at: now - TimeDelta::minutes(5),
            finished_at: None,
            ..successful(workflow_id, variant, now)
        }
    }

    #[test]
    fn support_requires_two_countable_matches() {
        let now = Utc::now();
        let u = unit(100, "B.1.1.7", now);

        assert!(!has_support(&u, &[], now));
        assert!(!has_support(&u, &[failed(100, "B.1.1.7", now)], now));
        assert!(!has_support(
            &u,
            &[successful(100, "B.1.1.7", now), failed(100, "B.1.1.7", now)],
            now
        ));
        assert!(has_support(
            &u,
            &[successful(100, "B.1.1.7", now), successful(100, "B.1.1.7", now)],
            now
        ));
        assert!(has_support(
            &u,
            &[successful(100, "B.1.1.7", now), in_flight(100, "B.1.1.7", now)],
            now
        ));
    }

    #[test]
    fn other_workflows_and_variants_do_not_count() {
        let now = Utc::now();
        let u = unit(100, "B.1.1.7", now);
        let tasks = [
            successful(100, "B.1.351", now),
            successful(101, "B.1.1.7", now),
            successful(100, "B.1.1.7", now),
        ];
        assert!(!has_support(&u, &tasks, now));
    }

    #[test]
    fn missing_units_keep_input_order() {
        let now = Utc::now();
        let units = [
            unit(1, "England2", now),
            unit(2, "England2", now),
            unit(3, "England2", now),
        ];
        let tasks = [
            successful(1, "England2", now),
            successful(1, "England2", now),
            successful(2, "England2", now),
            failed(3, "England2", now),
            failed(3, "England2", now),
        ];

        let missing = find_missing(&units, &tasks, now);
        let ids: Vec<i64> = missing.iter().map(|u| u.workflow_id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn extra_matches_still_satisfy() {
        let now = Utc::now();
        let u = unit(7, "B.1.617.2", now);
        let tasks = vec![successful(7, "B.1.617.2", now); 4];
        assert!(has_support(&u, &tasks, now));
    }
}
