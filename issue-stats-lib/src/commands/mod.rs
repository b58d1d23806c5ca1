//! Command-line interface and orchestration for issue-stats
//!
//! This module parses the command line, loads configuration, drives the GitHub
//! provider, and hands the classified results to the report generators.
//!
//! # Implementation Model
//!
//! The `run` function parses command-line arguments using clap and calls
//! `analyze`, which follows a fixed pipeline:
//!
//! 1. Initialize logging and load the configuration
//! 2. Reject option combinations that cannot produce samples
//! 3. Fetch issues, and collaborators or comments when the options need them
//! 4. Convert wire issues to records and classify them
//! 5. Summarize into a `ReportData` and emit the console summary and any
//!    requested files
//!
//! Configuration comes from a TOML file (`issue-stats.toml` by default) that
//! tunes the GitHub connection, bot detection, and histogram bin width.
//! Output goes through a [`Host`] so tests can capture it.

mod analyze;
mod common;
mod config;
mod host;
mod progress_reporter;
mod run;

#[cfg(debug_assertions)]
pub use config::Config;

pub use analyze::{AnalyzeArgs, analyze};
pub use host::Host;
pub use progress_reporter::ProgressReporter;
pub use run::run;
