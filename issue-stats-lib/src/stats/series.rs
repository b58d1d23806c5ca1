use crate::analysis::{Category, MetricSample};

/// The elapsed-day values of one category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySeries {
    pub category: Category,
    pub values: Vec<f64>,
}

impl CategorySeries {
    #[must_use]
    pub const fn new(category: Category, values: Vec<f64>) -> Self {
        Self { category, values }
    }

    /// Group samples into one series per requested category.
    ///
    /// Every category in `categories` yields a series, even when no sample
    /// belongs to it, and the order of `categories` is preserved.
    #[must_use]
    pub fn collect(samples: &[MetricSample], categories: &[Category]) -> Vec<Self> {
        categories
            .iter()
            .map(|&category| {
                let values = samples
                    .iter()
                    .filter(|s| s.category == category)
                    .map(|s| s.elapsed_days)
                    .collect();
                Self::new(category, values)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(number: u64, category: Category, elapsed_days: f64) -> MetricSample {
        MetricSample {
            number,
            category,
            elapsed_days,
        }
    }

    #[test]
    fn test_collect_keeps_requested_order_and_empty_groups() {
        let samples = [sample(1, Category::External, 2.0), sample(2, Category::External, 4.0)];
        let series = CategorySeries::collect(&samples, &[Category::Members, Category::External]);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].category, Category::Members);
        assert!(series[0].values.is_empty());
        assert_eq!(series[1].values, vec![2.0, 4.0]);
    }
}
