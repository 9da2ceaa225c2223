//! Analysis units, stitching tasks, and their derived status.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

use crate::error::ParseError;

/// How long a stitching task may stay unfinished before it counts as failed.
pub const IN_FLIGHT_WINDOW_SECS: i64 = 60 * 60;

/// Timestamp format used by the LIMS tracking tables.
const LIMS_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One analysis job that needs two stitched plates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisUnit {
    pub workflow_id: i64,
    pub variant: String,
    pub created_at: DateTime<Utc>,
    /// `None` while the analysis is still running.
    pub finished_at: Option<DateTime<Utc>>,
}

/// A stitching task as stored, before its identifiers are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportRecord {
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// A stitching task with `workflow_id` and `variant` resolved from its plate name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportTask {
    pub source_name: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub workflow_id: i64,
    pub variant: String,
}

/// Status of a stitching task relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportStatus {
    /// Created within the in-flight window; may still finish.
    New,
    /// Older than the window and finished.
    Successful,
    /// Older than the window and never finished.
    Failed,
}

impl SupportStatus {
    /// Whether a task in this status counts toward a unit's two plates.
    pub fn is_countable(self) -> bool {
        matches!(self, SupportStatus::New | SupportStatus::Successful)
    }
}

impl std::fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SupportStatus::New => "new",
            SupportStatus::Successful => "successful",
            SupportStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

impl SupportTask {
    /// Build a task from a stored record and the variant resolved for it.
    pub fn from_record(record: SupportRecord, variant: String) -> Result<Self, ParseError> {
        let workflow_id = super::source_name::derive_workflow_id(&record.source_name)?;
        Ok(Self {
            source_name: record.source_name,
            created_at: record.created_at,
            finished_at: record.finished_at,
            workflow_id,
            variant,
        })
    }

    /// Created more than the in-flight window before `now`.
    pub fn is_old(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > TimeDelta::seconds(IN_FLIGHT_WINDOW_SECS)
    }

    pub fn is_new(&self, now: DateTime<Utc>) -> bool {
        !self.is_old(now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> SupportStatus {
        if self.is_new(now) {
            SupportStatus::New
        } else if self.finished_at.is_none() {
            SupportStatus::Failed
        } else {
            SupportStatus::Successful
        }
    }
}

impl AnalysisUnit {
    /// Same workflow and same variant.
    pub fn matches(&self, task: &SupportTask) -> bool {
        self.workflow_id == task.workflow_id && self.variant == task.variant
    }
}

/// Parse a required LIMS timestamp.
pub fn parse_timestamp(column: &str, value: &str) -> Result<DateTime<Utc>, ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), LIMS_DATETIME_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|_| ParseError::Timestamp {
            column: column.to_string(),
            value: value.to_string(),
        })
}

/// Parse an optional LIMS timestamp.
///
/// NULL, empty, and MySQL's zero date all mean "not set".
pub fn parse_optional_timestamp(
    column: &str,
    value: Option<&str>,
) -> Result<Option<DateTime<Utc>>, ParseError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.starts_with("0000-00-00") => Ok(None),
        Some(v) => parse_timestamp(column, v).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(created_mins_ago: i64, finished: bool, now: DateTime<Utc>) -> SupportTask {
        SupportTask {
            source_name: "S01000123".into(),
            created_at: now - TimeDelta::minutes(created_mins_ago),
            finished_at: finished.then_some(now),
            workflow_id: 123,
            variant: "England2".into(),
        }
    }

    #[test]
    fn recent_unfinished_task_is_new() {
        let now = Utc::now();
        let t = task(10, false, now);
        assert_eq!(t.status(now), SupportStatus::New);
        assert!(t.status(now).is_countable());
    }

    #[test]
    fn old_unfinished_task_is_failed() {
        let now = Utc::now();
        let t = task(90, false, now);
        assert!(t.is_old(now));
        assert_eq!(t.status(now), SupportStatus::Failed);
        assert_eq!(t.status(now).to_string(), "failed");
        assert!(!t.status(now).is_countable());
    }

    #[test]
    fn old_finished_task_is_successful() {
        let now = Utc::now();
        let t = task(24 * 60, true, now);
        assert_eq!(t.status(now), SupportStatus::Successful);
    }

    #[test]
    fn exactly_one_hour_is_still_new() {
        let now = Utc::now();
        let t = task(60, false, now);
        assert!(t.is_new(now));
    }

    #[test]
    fn parses_lims_timestamp() {
        let dt = parse_timestamp("created_at", "2021-03-04 05:06:07").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-03-04T05:06:07+00:00");
    }

    #[test]
    fn rejects_garbage_timestamp() {
        let err = parse_timestamp("created_at", "yesterday").unwrap_err();
        assert!(matches!(err, ParseError::Timestamp { .. }));
    }

    #[test]
    fn optional_timestamp_treats_zero_date_as_unset() {
        assert_eq!(parse_optional_timestamp("finished_at", None).unwrap(), None);
        assert_eq!(parse_optional_timestamp("finished_at", Some("")).unwrap(), None);
        assert_eq!(
            parse_optional_timestamp("finished_at", Some("0000-00-00 00:00:00")).unwrap(),
            None
        );
        assert!(
            parse_optional_timestamp("finished_at", Some("2021-03-04 05:06:07"))
                .unwrap()
                .is_some()
        );
    }
}
