//! Production metrics and their milestone counters.

/// A cumulative production counter that earns milestone alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Workflow,
    Well,
    Plate,
    Image,
}

impl Metric {
    /// All metrics, in the order a run checks them.
    pub const ALL: [Metric; 4] = [Metric::Workflow, Metric::Well, Metric::Plate, Metric::Image];

    /// Counter-store key.
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Workflow => "workflow",
            Metric::Well => "well",
            Metric::Plate => "plate",
            Metric::Image => "image",
        }
    }

    /// Milestone step a freshly initialised counter starts with.
    pub fn default_base_unit(self) -> u64 {
        match self {
            Metric::Workflow => 1_000,
            Metric::Well => 5_000_000,
            Metric::Plate => 5_000,
            Metric::Image => 5_000_000,
        }
    }

    pub(crate) fn plural(self) -> &'static str {
        match self {
            Metric::Workflow => "workflows",
            Metric::Well => "wells",
            Metric::Plate => "plates",
            Metric::Image => "images",
        }
    }

    pub(crate) fn verb(self) -> &'static str {
        match self {
            Metric::Workflow => "registered",
            Metric::Well => "assayed",
            Metric::Plate => "stitched",
            Metric::Image => "imaged",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted milestone state for one metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MilestoneCounter {
    pub name: String,
    /// Starts at 1; bumped once per milestone notification.
    pub interval: u64,
    /// Fixed step between milestones.
    pub base_unit: u64,
}

impl MilestoneCounter {
    /// A new counter at its first milestone.
    pub fn new(name: impl Into<String>, base_unit: u64) -> Self {
        Self {
            name: name.into(),
            interval: 1,
            base_unit,
        }
    }

    /// The value the metric has to exceed for the next alert.
    pub fn threshold(&self) -> u64 {
        self.base_unit.saturating_mul(self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_match_counter_rows() {
        let names: Vec<&str> = Metric::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names, ["workflow", "well", "plate", "image"]);
        assert_eq!(Metric::Well.to_string(), "well");
    }

    #[test]
    fn threshold_is_linear_in_interval() {
        let mut counter = MilestoneCounter::new("plate", 5_000);
        assert_eq!(counter.threshold(), 5_000);
        counter.interval = 3;
        assert_eq!(counter.threshold(), 15_000);
    }
}
