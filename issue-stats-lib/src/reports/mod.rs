//! Multi-format report generation for analysis results
//!
//! This module renders the outcome of an analysis run for people and for
//! other programs.
//!
//! # Implementation Model
//!
//! Every generator consumes the same [`ReportData`], which is computed once
//! from the classification result: per-category series, summary statistics and
//! the shared histogram.
//!
//! - **Console**: the plain-text summary printed at the end of every run
//! - **HTML**: self-contained page with a Chart.js histogram, statistic cards and dark mode
//! - **CSV**: three companion files (histogram bins, per-category statistics, raw samples)
//! - **JSON**: machine-readable form of the same data
//!
//! Text generators write to a [`core::fmt::Write`]; the CSV generators write
//! bytes through the `csv` crate and take a [`std::io::Write`].

mod console;
mod csv;
mod html;
mod json;
mod report_data;

pub use console::generate as generate_console;
pub use csv::{generate_histogram as generate_histogram_csv, generate_raw_data as generate_raw_data_csv, generate_statistics as generate_statistics_csv};
pub use html::generate as generate_html;
pub use json::generate as generate_json;
pub use report_data::ReportData;
