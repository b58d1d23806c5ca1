use super::CategorySeries;
use crate::analysis::Category;
use serde::Serialize;

/// A fixed-width bin with one count per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramBin {
    pub low: u64,
    pub high: u64,

    /// Counts in the same order as [`Histogram::categories`]
    pub counts: Vec<usize>,
}

impl HistogramBin {
    /// Label in the `"{low}-{high}"` form.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}-{}", self.low, self.high)
    }
}

/// Bins shared by every category so the groups can be compared side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    pub bin_days: u64,
    pub categories: Vec<Category>,
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    /// Build bins of `bin_days` width starting at zero.
    ///
    /// There are `floor(max / bin_days) + 1` bins, where `max` is the largest
    /// value across all series. A value equal to a bin's upper edge falls in
    /// the next bin. Without any values there are no bins.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "bin widths are small integers")]
    #[expect(clippy::cast_possible_truncation, reason = "bin indices are bounded by the bin count")]
    #[expect(clippy::cast_sign_loss, reason = "negative values are filtered out")]
    pub fn build(series: &[CategorySeries], bin_days: u64) -> Self {
        let bin_days = bin_days.max(1);
        let width = bin_days as f64;
        let categories: Vec<_> = series.iter().map(|s| s.category).collect();

        let usable = |v: &&f64| v.is_finite() && **v >= 0.0;
        let max = series.iter().flat_map(|s| s.values.iter().filter(usable)).copied().reduce(f64::max);

        let Some(max) = max else {
            return Self {
                bin_days,
                categories,
                bins: Vec::new(),
            };
        };

        let bin_count = (max / width).floor() as usize + 1;
        let mut bins: Vec<_> = (0..bin_count as u64)
            .map(|i| HistogramBin {
                low: i * bin_days,
                high: (i + 1) * bin_days,
                counts: vec![0; series.len()],
            })
            .collect();

        for (column, s) in series.iter().enumerate() {
            for v in s.values.iter().filter(usable) {
                let index = ((v / width).floor() as usize).min(bin_count - 1);
                if let Some(count) = bins.get_mut(index).and_then(|bin| bin.counts.get_mut(column)) {
                    *count += 1;
                }
            }
        }

        Self {
            bin_days,
            categories,
            bins,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
