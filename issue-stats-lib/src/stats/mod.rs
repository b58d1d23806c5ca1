//! Descriptive statistics over elapsed-day samples
//!
//! Everything here is pure computation over `f64` day counts grouped by
//! [`Category`](crate::analysis::Category). Percentiles use linear
//! interpolation between order statistics and the standard deviation is the
//! population form.

mod histogram;
mod series;
mod summary;

pub use histogram::{Histogram, HistogramBin};
pub use series::CategorySeries;
pub use summary::{CategoryStats, StatSummary, SummaryError, percentile, summarize, summarize_categories};
