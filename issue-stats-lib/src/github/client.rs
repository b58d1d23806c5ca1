//! GitHub REST client
//!
//! A thin client that issues authenticated GET requests and classifies the
//! responses, plus the wire shapes of the endpoints this tool reads.

use crate::analysis::{Actor, CommentRecord, IssueRecord, RecordError, StateReason, parse_timestamp};
use chrono::{DateTime, Utc};
use super::resilient_http::{RetryPolicy, resilient_get};
use ohno::{EnrichableExt, app_err};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER};
use serde::Deserialize;
use serde::de::IgnoredAny;

const LOG_TARGET: &str = "    github";
const USER_AGENT: &str = concat!("issue-stats/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RATE_LIMIT_BACKOFF_SECS: i64 = 60;

/// GitHub account as embedded in issues and comments
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub login: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.clone(),
            is_bot_account: user.kind.as_deref() == Some("Bot"),
        }
    }
}

/// An entry from the repository issues endpoint.
///
/// Timestamps stay as text here so one malformed record cannot fail a whole page.
#[derive(Debug, Clone, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub created_at: Option<String>,
    pub closed_at: Option<String>,
    #[serde(default)]
    pub state_reason: Option<StateReason>,
    pub user: Option<User>,

    /// Present only when the entry is a pull request
    #[serde(default)]
    pub pull_request: Option<IgnoredAny>,

    /// Number of comments GitHub reports for the issue
    #[serde(rename = "comments", default)]
    pub comment_count: u64,

    /// Filled in separately when first response times are measured
    #[serde(skip)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Comment {
    pub user: Option<User>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collaborator {
    pub login: String,
}

impl TryFrom<&Issue> for IssueRecord {
    type Error = RecordError;

    fn try_from(issue: &Issue) -> Result<Self, Self::Error> {
        let number = issue.number;
        let created_at = parse_timestamp(number, "created_at", issue.created_at.as_deref())?;
        let closed_at = issue
            .closed_at
            .as_deref()
            .map(|ts| parse_timestamp(number, "closed_at", Some(ts)))
            .transpose()?;

        let comments = issue
            .comments
            .iter()
            .map(|c| {
                Ok(CommentRecord {
                    author: c.user.as_ref().map(Actor::from),
                    created_at: parse_timestamp(number, "comment created_at", c.created_at.as_deref())?,
                })
            })
            .collect::<Result<Vec<_>, RecordError>>()?;

        Ok(Self {
            id: issue.id,
            number,
            created_at,
            closed_at,
            state_reason: issue.state_reason,
            author: issue.user.as_ref().map(Actor::from),
            is_pull_request: issue.pull_request.is_some(),
            comments,
        })
    }
}

/// Rate limit information from response headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub remaining: usize,
    pub reset_at: DateTime<Utc>,
}

/// Result of a GitHub API call
#[derive(Debug)]
pub enum ApiResult<T> {
    /// Request succeeded, with rate limit info when GitHub sent it
    Success(T, Option<RateLimitInfo>),

    /// Quota exhausted; retry after the reset time
    RateLimited(RateLimitInfo),

    /// The token was rejected (401)
    Unauthorized,

    /// The requested resource was not found (404)
    NotFound,

    /// Request failed permanently and should not be retried
    Failed(ohno::AppError),
}

#[derive(Debug, Clone)]
#[expect(clippy::struct_field_names, reason = "client field stores the underlying HTTP client")]
pub struct Client {
    client: reqwest::Client,
    base_url: String,
    retry_policy: RetryPolicy,
}

impl Client {
    /// Create a client that authenticates every request with `token`.
    pub fn new(token: &str, base_url: impl Into<String>, retry_policy: RetryPolicy) -> crate::Result<Self> {
        let mut auth_val = HeaderValue::from_str(&format!("token {token}"))?;
        auth_val.set_sensitive(true);

        let mut headers = HeaderMap::new();
        let _ = headers.insert(AUTHORIZATION, auth_val);
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let base_url: String = base_url.into();

        Ok(Self {
            client: reqwest::Client::builder().user_agent(USER_AGENT).default_headers(headers).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry_policy,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` through the retry and timeout stack, then classify the response.
    pub async fn get(&self, url: &str) -> ApiResult<reqwest::Response> {
        match resilient_get(&self.client, url, self.retry_policy).await {
            Ok(resp) => classify_response(resp),
            Err(e) => ApiResult::Failed(e.enrich_with(|| format!("GET {url}"))),
        }
    }
}

fn classify_response(resp: reqwest::Response) -> ApiResult<reqwest::Response> {
    let rate_limit = extract_rate_limit_from_headers(resp.headers());
    let status = resp.status();

    if status.is_success() {
        return ApiResult::Success(resp, rate_limit);
    }

    match status {
        StatusCode::UNAUTHORIZED => ApiResult::Unauthorized,
        StatusCode::NOT_FOUND => ApiResult::NotFound,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            if let Some(retry_after) = extract_retry_after(resp.headers()) {
                // secondary rate limit
                return ApiResult::RateLimited(RateLimitInfo {
                    remaining: 0,
                    reset_at: Utc::now() + retry_after,
                });
            }

            match rate_limit {
                Some(info) if info.remaining == 0 => ApiResult::RateLimited(info),
                _ if status == StatusCode::TOO_MANY_REQUESTS => ApiResult::RateLimited(RateLimitInfo {
                    remaining: 0,
                    reset_at: Utc::now() + chrono::Duration::seconds(DEFAULT_RATE_LIMIT_BACKOFF_SECS),
                }),
                _ => ApiResult::Failed(app_err!("access forbidden ({status}) for {}", resp.url())),
            }
        }
        _ => ApiResult::Failed(app_err!("unexpected HTTP status {status} for {}", resp.url())),
    }
}

/// Extract rate limit information from API response headers
fn extract_rate_limit_from_headers(headers: &HeaderMap) -> Option<RateLimitInfo> {
    let remaining = headers.get("x-ratelimit-remaining")?.to_str().ok()?.parse::<usize>().ok()?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(RateLimitInfo { remaining, reset_at })
}

fn extract_retry_after(headers: &HeaderMap) -> Option<chrono::Duration> {
    let secs = headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse::<i64>().ok()?;
    Some(chrono::Duration::seconds(secs.max(0)))
}

/// Whether the `Link` header advertises another page.
pub(crate) fn has_next_page(headers: &HeaderMap) -> bool {
    headers
        .get(LINK)
        .and_then(|h| h.to_str().ok())
        .is_some_and(|link| link.contains(r#"rel="next""#))
}
