use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Why an issue was closed, as reported by GitHub.
///
/// Issues closed before GitHub tracked close reasons carry no reason at all,
/// which is modeled as `None` on [`IssueRecord::state_reason`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateReason {
    Completed,
    NotPlanned,
    Reopened,
    Duplicate,

    /// Any reason this tool does not know about yet
    #[serde(other)]
    Other,
}

/// The author of an issue or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub login: String,

    /// Whether GitHub reports the account type as `Bot`
    pub is_bot_account: bool,
}

impl Actor {
    #[must_use]
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            is_bot_account: false,
        }
    }

    #[must_use]
    pub fn bot(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            is_bot_account: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    pub author: Option<Actor>,
    pub created_at: DateTime<Utc>,
}

/// A snapshot of one issue with its timestamps parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRecord {
    pub id: u64,
    pub number: u64,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub state_reason: Option<StateReason>,

    /// `None` when the author account has been deleted
    pub author: Option<Actor>,
    pub is_pull_request: bool,

    /// Only populated when measuring first response time
    pub comments: Vec<CommentRecord>,
}

/// A wire record that could not be turned into an [`IssueRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    MissingTimestamp { number: u64, field: &'static str },
    BadTimestamp { number: u64, field: &'static str, value: String },
}

impl RecordError {
    #[must_use]
    pub const fn number(&self) -> u64 {
        match self {
            Self::MissingTimestamp { number, .. } | Self::BadTimestamp { number, .. } => *number,
        }
    }
}

impl Display for RecordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingTimestamp { number, field } => write!(f, "issue #{number} has no '{field}' timestamp"),
            Self::BadTimestamp { number, field, value } => {
                write!(f, "issue #{number} has an unparseable '{field}' timestamp '{value}'")
            }
        }
    }
}

impl core::error::Error for RecordError {}

/// Parse an RFC 3339 timestamp belonging to issue `number`.
pub(crate) fn parse_timestamp(number: u64, field: &'static str, value: Option<&str>) -> Result<DateTime<Utc>, RecordError> {
    let value = value.ok_or(RecordError::MissingTimestamp { number, field })?;
    match DateTime::parse_from_rfc3339(value) {
        Ok(ts) => Ok(ts.to_utc()),
        Err(_) => Err(RecordError::BadTimestamp {
            number,
            field,
            value: value.to_string(),
        }),
    }
}
