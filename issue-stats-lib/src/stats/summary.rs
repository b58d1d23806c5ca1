use super::CategorySeries;
use crate::analysis::Category;
use core::fmt::{Display, Formatter};
use serde::Serialize;

/// Why [`summarize`] could not describe its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryError {
    /// Nothing to describe; callers report the category with a zero count
    EmptyInput,

    /// A NaN or infinite value at `index`
    NonFinite { index: usize },
}

impl Display for SummaryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "no values to summarize"),
            Self::NonFinite { index } => write!(f, "value #{index} is not a finite number of days"),
        }
    }
}

impl core::error::Error for SummaryError {}

/// Descriptive statistics for a non-empty set of values, in days.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
}

/// Statistics for one category; `summary` is `None` when the category is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub summary: Option<StatSummary>,
}

/// Summarize `values`, which may be in any order.
///
/// Every value must be finite, so `count` always equals `values.len()`. The
/// standard deviation divides by `n`.
#[expect(clippy::cast_precision_loss, reason = "sample counts are far below 2^52")]
pub fn summarize(values: &[f64]) -> Result<StatSummary, SummaryError> {
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(SummaryError::NonFinite { index });
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let (Some(&min), Some(&max)) = (sorted.first(), sorted.last()) else {
        return Err(SummaryError::EmptyInput);
    };

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    Ok(StatSummary {
        count: sorted.len(),
        mean,
        median: percentile(&sorted, 50.0),
        min,
        max,
        std_dev: variance.sqrt(),
        p25: percentile(&sorted, 25.0),
        p75: percentile(&sorted, 75.0),
        p90: percentile(&sorted, 90.0),
        p95: percentile(&sorted, 95.0),
    })
}

/// Summarize each series independently.
///
/// Empty series come back with a zero count and no summary.
///
/// # Errors
///
/// Fails if any series holds a non-finite value.
pub fn summarize_categories(series: &[CategorySeries]) -> Result<Vec<CategoryStats>, SummaryError> {
    series
        .iter()
        .map(|s| {
            let summary = match summarize(&s.values) {
                Ok(summary) => Some(summary),
                Err(SummaryError::EmptyInput) => None,
                Err(e) => return Err(e),
            };

            Ok(CategoryStats {
                category: s.category,
                count: summary.map_or(0, |sum| sum.count),
                summary,
            })
        })
        .collect()
}

/// The `p`th percentile of already-sorted data.
///
/// The rank is `p / 100 * (n - 1)`; fractional ranks interpolate linearly
/// between the two neighboring values, so the 50th percentile is the median.
/// Returns 0.0 for empty input.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "sample counts are far below 2^52")]
#[expect(clippy::cast_possible_truncation, reason = "rank is within 0..n")]
#[expect(clippy::cast_sign_loss, reason = "rank is never negative")]
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let last_index = match sorted_data.len() {
        0 => return 0.0,
        n => n - 1,
    };

    let rank = (p / 100.0).clamp(0.0, 1.0) * last_index as f64;
    let lower_index = (rank.floor() as usize).min(last_index);
    let upper_index = (rank.ceil() as usize).min(last_index);
    let weight = rank - rank.floor();

    let lower = sorted_data.get(lower_index).copied().unwrap_or_default();
    let upper = sorted_data.get(upper_index).copied().unwrap_or_default();

    if lower_index == upper_index {
        return lower;
    }

    (upper - lower).mul_add(weight, lower).clamp(lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_summarize_one_to_five() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(s.count, 5);
        assert_close(s.mean, 3.0);
        assert_close(s.median, 3.0);
        assert_close(s.min, 1.0);
        assert_close(s.max, 5.0);
        assert_close(s.std_dev, 2.0_f64.sqrt());
        assert_close(s.p25, 2.0);
        assert_close(s.p75, 4.0);
    }

    #[test]
    fn test_summarize_interpolates_percentiles() {
        let s = summarize(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_close(s.p25, 1.75);
        assert_close(s.median, 2.5);
        assert_close(s.p75, 3.25);
        assert_close(s.p90, 3.7);
        assert_close(s.p95, 3.85);
    }

    #[test]
    fn test_summarize_single_value() {
        let s = summarize(&[7.25]).unwrap();
        assert_eq!(s.count, 1);
        for v in [s.mean, s.median, s.min, s.max, s.p25, s.p75, s.p90, s.p95] {
            assert_close(v, 7.25);
        }
        assert_close(s.std_dev, 0.0);
    }

    #[test]
    fn test_summarize_order_independent() {
        let a = summarize(&[5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        let b = summarize(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), Err(SummaryError::EmptyInput));
    }

    #[test]
    fn test_summarize_rejects_non_finite() {
        assert_eq!(summarize(&[1.0, f64::NAN, 3.0]), Err(SummaryError::NonFinite { index: 1 }));
        assert_eq!(summarize(&[f64::INFINITY]), Err(SummaryError::NonFinite { index: 0 }));
        assert_eq!(summarize(&[2.0, f64::NEG_INFINITY]), Err(SummaryError::NonFinite { index: 1 }));

        let err = summarize(&[f64::NAN]).unwrap_err();
        assert_eq!(err.to_string(), "value #0 is not a finite number of days");
    }

    #[test]
    fn test_summary_ordering_holds() {
        let datasets: [&[f64]; 4] = [
            &[0.1, 0.2, 0.2, 14.0, 30.5, 0.0, 2.75],
            &[100.0, 1.0],
            &[3.0, 3.0, 3.0],
            &[0.001, 365.0, 12.5, 7.0, 7.0, 8.0, 1.5, 90.0, 45.25, 0.5, 2.0],
        ];

        for data in datasets {
            let s = summarize(data).unwrap();
            assert_eq!(s.count, data.len());
            assert!(s.min <= s.p25, "{data:?}");
            assert!(s.p25 <= s.median, "{data:?}");
            assert!(s.median <= s.p75, "{data:?}");
            assert!(s.p75 <= s.p90, "{data:?}");
            assert!(s.p90 <= s.p95, "{data:?}");
            assert!(s.p95 <= s.max, "{data:?}");
        }
    }

    #[test]
    fn test_percentile_empty() {
        assert!((percentile(&[], 50.0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_percentile_bounds() {
        let data = [1.0, 5.0, 9.0];
        assert_close(percentile(&data, 0.0), 1.0);
        assert_close(percentile(&data, 100.0), 9.0);
        assert_close(percentile(&data, 150.0), 9.0);
        assert_close(percentile(&data, -5.0), 1.0);
    }

    #[test]
    fn test_percentile_median_even() {
        assert_close(percentile(&[1.0, 2.0, 3.0, 10.0], 50.0), 2.5);
    }

    #[test]
    fn test_summarize_categories_with_empty_group() {
        let series = [
            CategorySeries::new(Category::Members, Vec::new()),
            CategorySeries::new(Category::External, vec![1.0, 3.0]),
        ];

        let stats = summarize_categories(&series).unwrap();
        assert_eq!(stats.len(), 2);

        assert_eq!(stats[0].category, Category::Members);
        assert_eq!(stats[0].count, 0);
        assert!(stats[0].summary.is_none());

        assert_eq!(stats[1].count, 2);
        assert_close(stats[1].summary.unwrap().mean, 2.0);
    }

    #[test]
    fn test_summarize_categories_rejects_non_finite() {
        let series = [
            CategorySeries::new(Category::Members, vec![1.0]),
            CategorySeries::new(Category::External, vec![2.0, f64::NAN]),
        ];

        assert_eq!(summarize_categories(&series), Err(SummaryError::NonFinite { index: 1 }));
    }
}
