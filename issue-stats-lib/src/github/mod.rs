//! GitHub data collection
//!
//! Everything that talks to the GitHub REST API lives here: the HTTP client
//! and wire types, the paginated fetches for issues, collaborators and
//! comments, and rate limit handling.
//!
//! # Implementation Model
//!
//! [`Provider`] owns a [`Client`] and a shared [`Throttler`]. Every request
//! takes a throttler slot first. When GitHub reports an exhausted quota, or the
//! remaining quota drops below the configured threshold, the throttler is paused
//! until the reset time so that concurrent comment fetches all back off
//! together. Network errors, timed out attempts and 5xx responses are retried
//! by the client with exponential backoff, and every attempt is bounded by the
//! configured request timeout.
//!
//! Pagination follows the `Link` header: pages are requested in order until
//! GitHub stops advertising a `rel="next"` page.

mod client;
mod progress;
mod provider;
mod repo_spec;
mod resilient_http;
mod throttler;

pub use client::{ApiResult, Client, Collaborator, Comment, Issue, RateLimitInfo, User};
pub use progress::{NoProgress, Progress};
pub use provider::{Provider, ProviderSettings};
pub use repo_spec::RepoSpec;
pub use resilient_http::RetryPolicy;
pub use throttler::Throttler;
