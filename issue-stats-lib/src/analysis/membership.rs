use std::collections::HashSet;

/// Logins with push access to the analyzed repository.
///
/// GitHub logins are case-insensitive, so lookups ignore ASCII case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSet {
    logins: HashSet<String>,
}

impl MembershipSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a login, returning `false` if it was already present.
    pub fn insert(&mut self, login: &str) -> bool {
        self.logins.insert(login.to_ascii_lowercase())
    }

    #[must_use]
    pub fn contains(&self, login: &str) -> bool {
        self.logins.contains(&login.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.logins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for login in iter {
            let _ = set.insert(login.as_ref());
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for MembershipSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for login in iter {
            let _ = self.insert(login.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignores_case() {
        let set: MembershipSet = ["Octocat", "hubot"].into_iter().collect();
        assert!(set.contains("octocat"));
        assert!(set.contains("OCTOCAT"));
        assert!(set.contains("HuBot"));
        assert!(!set.contains("monalisa"));
    }

    #[test]
    fn test_insert_deduplicates_across_case() {
        let mut set = MembershipSet::new();
        assert!(set.insert("Alice"));
        assert!(!set.insert("alice"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_empty() {
        let set = MembershipSet::new();
        assert!(set.is_empty());
        assert!(!set.contains(""));
    }

    #[test]
    fn test_extend() {
        let mut set: MembershipSet = ["a"].into_iter().collect();
        set.extend(vec!["b".to_string(), "C".to_string()]);
        assert_eq!(set.len(), 3);
        assert!(set.contains("c"));
    }
}
