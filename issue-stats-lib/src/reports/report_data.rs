use crate::analysis::{Category, Classification, ClassifyOptions, ExclusionTally, MembershipView, MetricKind, MetricSample, StateFilter};
use crate::stats::{CategorySeries, CategoryStats, Histogram, summarize_categories};
use chrono::{DateTime, Local};

/// Everything a report needs, computed once and shared by all formats.
#[derive(Debug, Clone)]
pub struct ReportData {
    pub repo: String,
    pub metric: MetricKind,
    pub state: StateFilter,
    pub view: MembershipView,
    pub generated_at: DateTime<Local>,

    /// Entries returned by GitHub, pull requests included
    pub issues_fetched: usize,
    pub excluded: ExclusionTally,
    pub samples: Vec<MetricSample>,
    pub series: Vec<CategorySeries>,
    pub stats: Vec<CategoryStats>,
    pub histogram: Histogram,
}

impl ReportData {
    /// Group, summarize and bin `classification` for reporting.
    ///
    /// # Errors
    ///
    /// Fails if a sample's elapsed time is not a finite number of days.
    pub fn new(
        repo: impl Into<String>,
        options: &ClassifyOptions,
        classification: Classification,
        bin_days: u64,
        generated_at: DateTime<Local>,
    ) -> crate::Result<Self> {
        let series = CategorySeries::collect(&classification.samples, options.view.categories());
        let stats = summarize_categories(&series)?;
        let histogram = Histogram::build(&series, bin_days);

        Ok(Self {
            repo: repo.into(),
            metric: options.metric,
            state: options.state,
            view: options.view,
            generated_at,
            issues_fetched: classification.examined,
            excluded: classification.excluded,
            samples: classification.samples,
            series,
            stats,
            histogram,
        })
    }

    /// Number of issues that produced a sample.
    #[must_use]
    pub const fn analyzed(&self) -> usize {
        self.samples.len()
    }

    /// Heading for the section describing `category`.
    #[must_use]
    pub fn section_title(&self, category: Category) -> String {
        let metric = self.metric.title().to_uppercase();
        match (category, self.view) {
            (Category::All, MembershipView::ExcludeMembers) => format!("EXTERNAL USER ISSUES - {metric} ANALYSIS"),
            (Category::All, _) => format!("GITHUB ISSUE {metric} ANALYSIS"),
            (Category::Members, _) => format!("REPOSITORY MEMBER ISSUES - {metric} ANALYSIS"),
            (Category::External, _) => format!("EXTERNAL USER ISSUES - {metric} ANALYSIS"),
        }
    }

    /// Name used for `category` in charts and tables.
    #[must_use]
    pub const fn series_name(&self, category: Category) -> &'static str {
        match (category, self.view) {
            (Category::All, MembershipView::ExcludeMembers) => Category::External.display_name(),
            _ => category.display_name(),
        }
    }
}

/// Format `n` with thousands separators.
pub(super) fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
pub(super) mod test_data {
    use super::*;
    use chrono::TimeZone;

    pub fn timestamp() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    pub fn sample(number: u64, category: Category, elapsed_days: f64) -> MetricSample {
        MetricSample {
            number,
            category,
            elapsed_days,
        }
    }

    pub fn combined() -> ReportData {
        let classification = Classification {
            examined: 7,
            samples: vec![
                sample(1, Category::All, 1.0),
                sample(2, Category::All, 2.0),
                sample(3, Category::All, 3.0),
                sample(4, Category::All, 4.0),
                sample(5, Category::All, 12.5),
            ],
            excluded: ExclusionTally {
                pull_requests: 1,
                not_planned: 1,
                ..ExclusionTally::default()
            },
        };

        ReportData::new("octo/widgets", &ClassifyOptions::default(), classification, 5, timestamp()).unwrap()
    }

    pub fn separate() -> ReportData {
        let classification = Classification {
            examined: 3,
            samples: vec![sample(10, Category::External, 0.5), sample(11, Category::External, 6.5)],
            excluded: ExclusionTally {
                negative_duration: 1,
                ..ExclusionTally::default()
            },
        };

        let options = ClassifyOptions {
            view: MembershipView::Separate,
            ..ClassifyOptions::default()
        };
        ReportData::new("octo/widgets", &options, classification, 5, timestamp()).unwrap()
    }
}
