use super::Actor;
use std::collections::HashSet;

/// Decides whether an actor is an automated account.
///
/// Comments from bots never count as a first response. Any closure of the
/// form `Fn(&Actor) -> bool` can be used as a detector.
pub trait BotDetector: Send + Sync {
    fn is_bot(&self, actor: &Actor) -> bool;
}

impl<F> BotDetector for F
where
    F: Fn(&Actor) -> bool + Send + Sync,
{
    fn is_bot(&self, actor: &Actor) -> bool {
        self(actor)
    }
}

/// Flags accounts GitHub marks as bots, plus logins matching configured
/// suffixes or listed explicitly.
#[derive(Debug, Clone)]
pub struct LoginBotDetector {
    suffixes: Vec<String>,
    logins: HashSet<String>,
}

impl LoginBotDetector {
    #[must_use]
    pub fn new<S, L>(suffixes: S, logins: L) -> Self
    where
        S: IntoIterator,
        S::Item: AsRef<str>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            logins: logins.into_iter().map(|l| l.as_ref().to_ascii_lowercase()).collect(),
        }
    }
}

impl Default for LoginBotDetector {
    fn default() -> Self {
        Self::new(["[bot]"], core::iter::empty::<&str>())
    }
}

impl BotDetector for LoginBotDetector {
    fn is_bot(&self, actor: &Actor) -> bool {
        if actor.is_bot_account {
            return true;
        }

        let login = actor.login.to_ascii_lowercase();
        self.logins.contains(&login) || self.suffixes.iter().any(|suffix| login.ends_with(suffix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags_bot_suffix() {
        let detector = LoginBotDetector::default();
        assert!(detector.is_bot(&Actor::new("dependabot[bot]")));
        assert!(detector.is_bot(&Actor::new("Renovate[BOT]")));
        assert!(!detector.is_bot(&Actor::new("octocat")));
    }

    #[test]
    fn test_account_type_wins() {
        let detector = LoginBotDetector::new(core::iter::empty::<&str>(), core::iter::empty::<&str>());
        assert!(detector.is_bot(&Actor::bot("some-app")));
        assert!(!detector.is_bot(&Actor::new("some-app")));
    }

    #[test]
    fn test_explicit_logins() {
        let detector = LoginBotDetector::new(["[bot]"], ["k8s-ci-robot", "Msftbot"]);
        assert!(detector.is_bot(&Actor::new("K8s-CI-Robot")));
        assert!(detector.is_bot(&Actor::new("msftbot")));
        assert!(!detector.is_bot(&Actor::new("robot-fan")));
    }

    #[test]
    fn test_empty_suffix_ignored() {
        let detector = LoginBotDetector::new([""], core::iter::empty::<&str>());
        assert!(!detector.is_bot(&Actor::new("octocat")));
    }

    #[test]
    fn test_closure_detector() {
        let detector = |actor: &Actor| actor.login.starts_with("ci-");
        assert!(detector.is_bot(&Actor::new("ci-runner")));
        assert!(!detector.is_bot(&Actor::new("octocat")));
    }
}
