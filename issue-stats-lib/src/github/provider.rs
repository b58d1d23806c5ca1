use super::client::{ApiResult, Client, Collaborator, Comment, Issue, RateLimitInfo, has_next_page};
use super::{Progress, RepoSpec, RetryPolicy, Throttler};
use crate::Result;
use crate::analysis::{MembershipSet, StateFilter};
use chrono::Utc;
use core::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use core::time::Duration;
use futures_util::future::join_all;
use ohno::{EnrichableExt, app_err};
use serde::de::DeserializeOwned;
use std::sync::Arc;

const LOG_TARGET: &str = "    github";
const MAX_RATE_LIMIT_RETRIES: u32 = 5;
const MAX_PAGE_SIZE: u8 = 100;

/// Knobs for talking to the GitHub API.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,

    /// Upper bound on a single wait for a rate limit reset
    pub max_rate_limit_wait: Duration,

    /// Pause proactively once fewer requests than this remain
    pub rate_limit_threshold: usize,

    pub max_concurrent_requests: usize,

    /// Per-attempt timeout and backoff for transient failures
    pub retry: RetryPolicy,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            max_rate_limit_wait: Duration::from_hours(1),
            rate_limit_threshold: 10,
            max_concurrent_requests: 5,
            retry: RetryPolicy::default(),
        }
    }
}

/// Macro to unwrap `ApiResult` or propagate any other outcome
macro_rules! unwrap_or_return {
    ($expr:expr) => {
        match $expr {
            ApiResult::Success(data, rate_limit) => (data, rate_limit),
            ApiResult::RateLimited(rate_limit) => return ApiResult::RateLimited(rate_limit),
            ApiResult::Unauthorized => return ApiResult::Unauthorized,
            ApiResult::NotFound => return ApiResult::NotFound,
            ApiResult::Failed(e) => return ApiResult::Failed(e),
        }
    };
}

/// Fetches issues, collaborators and comments for a repository.
#[derive(Debug)]
pub struct Provider {
    client: Client,
    throttler: Arc<Throttler>,
    settings: ProviderSettings,
}

impl Provider {
    pub fn new(token: &str, settings: ProviderSettings) -> Result<Self> {
        Ok(Self {
            client: Client::new(token, settings.base_url.as_str(), settings.retry)?,
            throttler: Throttler::new(settings.max_concurrent_requests),
            settings,
        })
    }

    /// Fetch every issue (and pull request) in `state`, following pagination to the end.
    ///
    /// # Errors
    ///
    /// Fails when the token is rejected, the repository does not exist, or
    /// GitHub keeps failing after retries.
    pub async fn get_issues(&self, repo: &RepoSpec, state: StateFilter, per_page: u8, progress: &dyn Progress) -> Result<Vec<Issue>> {
        log::info!(target: LOG_TARGET, "Fetching {state} issues for repository '{repo}'");

        let fetched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetched);
        let repo_name = repo.to_string();
        progress.set_phase("Issues");
        progress.set_indeterminate(Box::new(move || {
            format!("{} {state} issue(s) fetched from {repo_name}", counter.load(Ordering::Relaxed))
        }));

        let url = format!("{}/repos/{}/{}/issues?state={state}", self.client.base_url(), repo.owner(), repo.repo());
        let mut issues = Vec::new();

        match self.get_all_pages(&url, per_page, &mut issues, &fetched, progress).await {
            ApiResult::Success((), _) => {}
            ApiResult::Unauthorized => {
                return Err(app_err!("authentication failed: GitHub rejected the token (HTTP 401)"));
            }
            ApiResult::NotFound => {
                return Err(app_err!("repository '{repo}' was not found, or the token cannot access it"));
            }
            ApiResult::RateLimited(info) => return Err(rate_limit_error(info)),
            ApiResult::Failed(e) => return Err(e.enrich_with(|| format!("could not fetch issues for repository '{repo}'"))),
        }

        log::info!(target: LOG_TARGET, "Fetched {} issue(s) for repository '{repo}'", issues.len());
        Ok(issues)
    }

    /// Fetch the logins with access to the repository.
    ///
    /// Failures are logged and whatever was fetched before the failure is returned,
    /// since tokens without push access cannot list collaborators.
    pub async fn get_collaborators(&self, repo: &RepoSpec, progress: &dyn Progress) -> MembershipSet {
        log::info!(target: LOG_TARGET, "Fetching collaborators for repository '{repo}'");

        let fetched = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fetched);
        progress.set_phase("Members");
        progress.set_indeterminate(Box::new(move || format!("{} collaborator(s) fetched", counter.load(Ordering::Relaxed))));

        let url = format!("{}/repos/{}/{}/collaborators", self.client.base_url(), repo.owner(), repo.repo());
        let mut collaborators: Vec<Collaborator> = Vec::new();

        let failure = match self.get_all_pages(&url, MAX_PAGE_SIZE, &mut collaborators, &fetched, progress).await {
            ApiResult::Success((), _) => None,
            ApiResult::Unauthorized => Some("the token was rejected".to_string()),
            ApiResult::NotFound => Some("the collaborator list is not visible to this token".to_string()),
            ApiResult::RateLimited(info) => Some(rate_limit_error(info).to_string()),
            ApiResult::Failed(e) => Some(format!("{e:#}")),
        };

        if let Some(reason) = failure {
            log::warn!(
                target: LOG_TARGET,
                "Could not fetch all collaborators for '{repo}', continuing with {} member(s): {reason}",
                collaborators.len()
            );
        }

        let members: MembershipSet = collaborators.iter().map(|c| c.login.as_str()).collect();
        log::info!(target: LOG_TARGET, "Found {} collaborator(s) for repository '{repo}'", members.len());
        members
    }

    /// Fetch comments for every issue that has any, concurrently.
    ///
    /// Pull requests are skipped since they never produce samples. An issue
    /// whose comments cannot be fetched is logged and left without comments.
    ///
    /// # Errors
    ///
    /// Fails when the token is rejected or the rate limit stays exhausted.
    pub async fn attach_comments(&self, repo: &RepoSpec, issues: &mut [Issue], progress: &dyn Progress) -> Result<()> {
        let wanted: Vec<_> = issues
            .iter_mut()
            .filter(|issue| issue.pull_request.is_none() && issue.comment_count > 0)
            .collect();

        let total = wanted.len() as u64;
        let done = Arc::new(AtomicU64::new(0));
        let done_for_callback = Arc::clone(&done);
        progress.set_phase("Comments");
        progress.set_determinate(Box::new(move || {
            let current = done_for_callback.load(Ordering::Relaxed);
            (total, current, format!("{current}/{total} issue(s)"))
        }));

        log::info!(target: LOG_TARGET, "Fetching comments for {total} issue(s) in repository '{repo}'");

        let tasks = wanted.into_iter().map(|issue| {
            let done = Arc::clone(&done);
            async move {
                let url = format!(
                    "{}/repos/{}/{}/issues/{}/comments",
                    self.client.base_url(),
                    repo.owner(),
                    repo.repo(),
                    issue.number
                );
                let counter = AtomicUsize::new(0);
                let mut comments: Vec<Comment> = Vec::new();
                let result = self.get_all_pages(&url, MAX_PAGE_SIZE, &mut comments, &counter, progress).await;
                let _ = done.fetch_add(1, Ordering::Relaxed);

                let reason = match result {
                    ApiResult::Success((), _) => {
                        issue.comments = comments;
                        return Ok(());
                    }
                    ApiResult::Unauthorized => return Err(app_err!("authentication failed: GitHub rejected the token (HTTP 401)")),
                    ApiResult::RateLimited(info) => return Err(rate_limit_error(info)),
                    ApiResult::NotFound => "GitHub returned 404".to_string(),
                    ApiResult::Failed(e) => format!("{e:#}"),
                };

                // left without comments, the issue counts as unanswered
                log::warn!(target: LOG_TARGET, "Could not fetch comments for issue #{}, treating it as unanswered: {reason}", issue.number);
                Ok(())
            }
        });

        join_all(tasks).await.into_iter().collect()
    }

    /// Walk `page=1, 2, ...` until GitHub stops advertising a next page.
    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
        per_page: u8,
        sink: &mut Vec<T>,
        fetched: &AtomicUsize,
        progress: &dyn Progress,
    ) -> ApiResult<()> {
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE);
        let separator = if url.contains('?') { '&' } else { '?' };
        let mut latest_rate_limit = None;
        let mut page_num = 1_u32;

        loop {
            let page_url = format!("{url}{separator}per_page={per_page}&page={page_num}");
            let ((items, has_next), rate_limit) = unwrap_or_return!(self.get_page::<T>(&page_url, progress).await);
            latest_rate_limit = rate_limit.or(latest_rate_limit);

            if items.is_empty() {
                break;
            }

            let _ = fetched.fetch_add(items.len(), Ordering::Relaxed);
            sink.extend(items);

            if !has_next {
                break;
            }

            page_num += 1;
        }

        log::debug!(target: LOG_TARGET, "Fetched {page_num} page(s) from {url}");
        ApiResult::Success((), latest_rate_limit)
    }

    /// Fetch one page, waiting out rate limits along the way.
    async fn get_page<T: DeserializeOwned>(&self, url: &str, progress: &dyn Progress) -> ApiResult<(Vec<T>, bool)> {
        let mut rate_limit_hits = 0;

        loop {
            let permit = self.throttler.acquire().await;
            log::trace!(target: LOG_TARGET, "GET {url}");

            match self.client.get(url).await {
                ApiResult::Success(resp, rate_limit) => {
                    let has_next = has_next_page(resp.headers());
                    let body = resp.json::<Vec<T>>().await;
                    drop(permit);

                    if let Some(info) = rate_limit
                        && info.remaining < self.settings.rate_limit_threshold
                    {
                        log::info!(
                            target: LOG_TARGET,
                            "Only {} GitHub request(s) left before the rate limit resets",
                            info.remaining
                        );
                        self.pause_until_reset(info, progress);
                    }

                    return match body {
                        Ok(items) => ApiResult::Success((items, has_next), rate_limit),
                        Err(e) => ApiResult::Failed(ohno::AppError::from(e).enrich_with(|| format!("could not decode response from {url}"))),
                    };
                }
                ApiResult::RateLimited(info) => {
                    drop(permit);
                    rate_limit_hits += 1;
                    if rate_limit_hits > MAX_RATE_LIMIT_RETRIES {
                        return ApiResult::RateLimited(info);
                    }

                    log::warn!(target: LOG_TARGET, "Hit GitHub rate limit, waiting for it to reset");
                    self.pause_until_reset(info, progress);
                }
                ApiResult::Unauthorized => return ApiResult::Unauthorized,
                ApiResult::NotFound => return ApiResult::NotFound,
                ApiResult::Failed(e) => return ApiResult::Failed(e),
            }
        }
    }

    /// Hold back all requests until `info.reset_at`, capped by the configured maximum.
    fn pause_until_reset(&self, info: RateLimitInfo, progress: &dyn Progress) {
        let now = Utc::now();
        let Ok(until_reset) = (info.reset_at - now).to_std() else {
            return; // already reset
        };

        // GitHub resets on whole seconds; wait one more to be past it
        let wait = (until_reset + Duration::from_secs(1)).min(self.settings.max_rate_limit_wait);
        if self.throttler.pause_for(wait) {
            let resume_at = (now + chrono::Duration::from_std(wait).unwrap_or_default()).with_timezone(&chrono::Local).format("%T");
            log::info!(target: LOG_TARGET, "Pausing GitHub requests until {resume_at}");
            if !log::log_enabled!(log::Level::Info) {
                progress.println(&format!("GitHub rate limit reached: waiting until {resume_at}..."));
            }
        }
    }
}

fn rate_limit_error(info: RateLimitInfo) -> ohno::AppError {
    app_err!(
        "GitHub rate limit exhausted; it resets at {}",
        info.reset_at.with_timezone(&chrono::Local).format("%T")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::NoProgress;

    #[test]
    fn test_default_settings() {
        let settings = ProviderSettings::default();
        assert_eq!(settings.base_url, "https://api.github.com");
        assert_eq!(settings.max_rate_limit_wait, Duration::from_secs(3600));
        assert_eq!(settings.rate_limit_threshold, 10);
        assert_eq!(settings.max_concurrent_requests, 5);
        assert_eq!(settings.retry.request_timeout, Duration::from_secs(60));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    async fn test_past_reset_does_not_pause() {
        let provider = Provider::new("token", ProviderSettings::default()).unwrap();
        let info = RateLimitInfo {
            remaining: 0,
            reset_at: Utc::now() - chrono::Duration::seconds(30),
        };

        provider.pause_until_reset(info, &NoProgress);
        assert!(!provider.throttler.is_paused());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetSystemTimePreciseAsFileTime")]
    async fn test_future_reset_pauses_with_cap() {
        let settings = ProviderSettings {
            max_rate_limit_wait: Duration::from_millis(50),
            ..ProviderSettings::default()
        };
        let provider = Provider::new("token", settings).unwrap();
        let info = RateLimitInfo {
            remaining: 0,
            reset_at: Utc::now() + chrono::Duration::hours(2),
        };

        provider.pause_until_reset(info, &NoProgress);
        assert!(provider.throttler.is_paused());

        let start = tokio::time::Instant::now();
        let _permit = provider.throttler.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_rate_limit_error_message() {
        let info = RateLimitInfo {
            remaining: 0,
            reset_at: Utc::now(),
        };
        assert!(rate_limit_error(info).to_string().contains("rate limit exhausted"));
    }
}
