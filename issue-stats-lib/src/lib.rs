#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for issue-stats
//!
//! This library holds all functionality of the issue-stats tool, which measures
//! how long issues in a GitHub repository take to get resolved, or to get a
//! first response from a repository member.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`github`]: Issue, collaborator and comment retrieval from the GitHub API
//! - [`analysis`]: Issue eligibility and elapsed-time measurement
//! - [`stats`]: Summary statistics and histograms
//! - [`reports`]: Report generation in multiple formats

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod analysis;
#[cfg(not(any(debug_assertions, test)))]
mod analysis;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

#[cfg(any(debug_assertions, test))]
pub mod github;
#[cfg(not(any(debug_assertions, test)))]
mod github;

#[cfg(any(debug_assertions, test))]
pub mod reports;
#[cfg(not(any(debug_assertions, test)))]
mod reports;

#[cfg(any(debug_assertions, test))]
pub mod stats;
#[cfg(not(any(debug_assertions, test)))]
mod stats;

pub use crate::commands::{Host, run};
