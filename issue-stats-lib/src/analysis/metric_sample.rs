use serde::Serialize;
use strum::{Display, EnumIter};

/// The population an issue is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    All,
    Members,
    External,
}

impl Category {
    /// Human-readable name used in report headings.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::All => "All Issues",
            Self::Members => "Repository Members",
            Self::External => "External Users",
        }
    }
}

/// One measured issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSample {
    pub number: u64,
    pub category: Category,
    pub elapsed_days: f64,
}
