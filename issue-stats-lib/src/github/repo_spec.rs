use crate::Result;
use core::fmt::{Display, Formatter};
use ohno::{IntoAppError, bail};
use url::Url;

/// A GitHub repository, identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSpec {
    owner: String,
    repo: String,
}

impl RepoSpec {
    /// Parse `owner/repo` or a repository URL such as `https://github.com/owner/repo`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();

        if text.contains("://") {
            let url = Url::parse(text).into_app_err_with(|| format!("parsing repository URL '{text}'"))?;
            let segments: Vec<_> = url
                .path_segments()
                .map(|segments| segments.filter(|s| !s.is_empty()).collect())
                .unwrap_or_default();

            let [owner, repo, ..] = segments.as_slice() else {
                bail!("repository URL '{text}' does not name an owner and a repository");
            };

            return Self::new(owner, repo.trim_end_matches(".git"));
        }

        let mut parts = text.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) => Self::new(owner, repo),
            _ => bail!("invalid repository '{text}': expected 'owner/repo'"),
        }
    }

    fn new(owner: &str, repo: &str) -> Result<Self> {
        for (what, value) in [("owner", owner), ("repository name", repo)] {
            if value.is_empty() {
                bail!("invalid repository: the {what} is empty");
            }

            if !value.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')) {
                bail!("invalid repository: the {what} '{value}' contains characters GitHub does not allow");
            }
        }

        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.repo
    }
}

impl Display for RepoSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
