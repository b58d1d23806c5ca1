//! Issue eligibility and elapsed-time measurement
//!
//! This module turns fetched issue records into metric samples. It performs no
//! I/O: the caller supplies the records, the repository membership and the
//! analysis options, and receives samples plus a tally of what was skipped.
//!
//! # Implementation Model
//!
//! - [`IssueRecord`] is the parsed, immutable view of one issue. Records are
//!   built from the wire representation elsewhere; a record that cannot be
//!   built surfaces as a [`RecordError`].
//! - [`MembershipSet`] holds the logins with push access to the repository.
//! - [`BotDetector`] decides whether a commenter is automation.
//! - [`Classifier`] applies the eligibility rules in a fixed order and computes
//!   the elapsed days for the selected [`MetricKind`].

mod bot_detector;
mod classifier;
mod issue_record;
mod membership;
mod metric_sample;

pub use bot_detector::{BotDetector, LoginBotDetector};
pub use classifier::{Classification, ClassifyOptions, Classifier, Exclusion, ExclusionTally, MembershipView, MetricKind, StateFilter};
pub use issue_record::{Actor, CommentRecord, IssueRecord, RecordError, StateReason};
pub(crate) use issue_record::parse_timestamp;
pub use membership::MembershipSet;
pub use metric_sample::{Category, MetricSample};
