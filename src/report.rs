//! Alert texts for reconciliation gaps and milestone crossings.

use std::fmt::Write as _;

use crate::milestones::Metric;
use crate::tasks::AnalysisUnit;

/// Header plus one ` - <workflow>  <variant>` line per unit, in the given order.
pub fn format_missing(missing: &[&AnalysisUnit]) -> String {
    let mut msg = format!("Found {} analyses with <2 stitched plates:\n", missing.len());
    for unit in missing {
        let _ = writeln!(msg, " - {}  {}", unit.workflow_id, unit.variant);
    }
    msg
}

pub fn format_milestone(metric: Metric, threshold: u64, current: u64) -> String {
    format!(
        "New milestone! Over {threshold} {} ({current}) {}",
        metric.plural(),
        metric.verb()
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn unit(workflow_id: i64, variant: &str) -> AnalysisUnit {
        AnalysisUnit {
            workflow_id,
            variant: variant.into(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn missing_report_lists_units_in_order() {
        let a = unit(412, "B.1.1.7");
        let b = unit(98, "England2");
        let msg = format_missing(&[&a, &b]);
        assert_eq!(
            msg,
            "Found 2 analyses with <2 stitched plates:\n - 412  B.1.1.7\n - 98  England2\n"
        );
    }

    #[test]
    fn well_milestone_text() {
        assert_eq!(
            format_milestone(Metric::Well, 5_000_000, 5_000_001),
            "New milestone! Over 5000000 wells (5000001) assayed"
        );
    }

    #[test]
    fn each_metric_has_its_own_wording() {
        assert_eq!(
            format_milestone(Metric::Workflow, 1_000, 1_001),
            "New milestone! Over 1000 workflows (1001) registered"
        );
        assert_eq!(
            format_milestone(Metric::Plate, 5_000, 5_123),
            "New milestone! Over 5000 plates (5123) stitched"
        );
        assert_eq!(
            format_milestone(Metric::Image, 10_000_000, 10_000_002),
            "New milestone! Over 10000000 images (10000002) imaged"
        );
    }
}
