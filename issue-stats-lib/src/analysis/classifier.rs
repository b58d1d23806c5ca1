use super::{BotDetector, Category, IssueRecord, MembershipSet, MetricSample, RecordError, StateReason};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use core::fmt::{Debug, Formatter};
use serde::Serialize;
use strum::Display;

const LOG_TARGET: &str = "  classify";
const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Which elapsed time is measured for each issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// From creation until the issue was closed
    #[default]
    Resolution,

    /// From creation until the first comment by a repository member
    FirstResponse,
}

impl MetricKind {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Resolution => "Resolution Time",
            Self::FirstResponse => "First Response Time",
        }
    }
}

/// Which issues are requested from GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum StateFilter {
    /// Only open issues
    Open,

    /// Only closed issues
    #[default]
    Closed,

    /// Open and closed issues
    All,
}

/// How repository membership shapes the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipView {
    /// Every eligible issue lands in [`Category::All`]
    #[default]
    Combined,

    /// Issues are split into [`Category::Members`] and [`Category::External`]
    Separate,

    /// Issues opened by members are dropped
    ExcludeMembers,
}

impl MembershipView {
    /// The categories samples are labeled with under this view.
    #[must_use]
    pub const fn categories(self) -> &'static [Category] {
        match self {
            Self::Separate => &[Category::Members, Category::External],
            Self::Combined | Self::ExcludeMembers => &[Category::All],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClassifyOptions {
    pub metric: MetricKind,
    pub state: StateFilter,
    pub include_unresolved: bool,
    pub view: MembershipView,
}

/// Why an issue produced no sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Exclusion {
    PullRequest,
    NotClosed,
    NotPlanned,
    Member,
    NoResponse,
    Malformed(RecordError),
    NegativeDuration { number: u64, days: f64 },
}

impl Exclusion {
    /// Whether this exclusion points at bad data rather than policy.
    #[must_use]
    pub const fn is_anomaly(&self) -> bool {
        matches!(self, Self::Malformed(_) | Self::NegativeDuration { .. })
    }
}

impl core::fmt::Display for Exclusion {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PullRequest => write!(f, "pull request"),
            Self::NotClosed => write!(f, "issue that is still open"),
            Self::NotPlanned => write!(f, "issue closed as not planned"),
            Self::Member => write!(f, "issue opened by a repository member"),
            Self::NoResponse => write!(f, "issue without a member response"),
            Self::Malformed(e) => write!(f, "malformed record: {e}"),
            Self::NegativeDuration { number, days } => {
                write!(f, "issue #{number}: it ends {:.2} day(s) before it was created", -days)
            }
        }
    }
}

/// Count of skipped issues, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionTally {
    pub pull_requests: usize,
    pub not_closed: usize,
    pub not_planned: usize,
    pub members: usize,
    pub no_response: usize,
    pub malformed: usize,
    pub negative_duration: usize,
}

impl ExclusionTally {
    pub const fn record(&mut self, exclusion: &Exclusion) {
        match exclusion {
            Exclusion::PullRequest => self.pull_requests += 1,
            Exclusion::NotClosed => self.not_closed += 1,
            Exclusion::NotPlanned => self.not_planned += 1,
            Exclusion::Member => self.members += 1,
            Exclusion::NoResponse => self.no_response += 1,
            Exclusion::Malformed(_) => self.malformed += 1,
            Exclusion::NegativeDuration { .. } => self.negative_duration += 1,
        }
    }

    #[must_use]
    pub const fn anomalies(&self) -> usize {
        self.malformed + self.negative_duration
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.pull_requests + self.not_closed + self.not_planned + self.members + self.no_response + self.anomalies()
    }
}

/// Outcome of classifying a batch of records.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub examined: usize,
    pub samples: Vec<MetricSample>,
    pub excluded: ExclusionTally,
}

/// Applies the eligibility rules and measures elapsed time.
pub struct Classifier<'a> {
    membership: &'a MembershipSet,
    bots: &'a dyn BotDetector,
    options: ClassifyOptions,
}

impl<'a> Classifier<'a> {
    #[must_use]
    pub fn new(membership: &'a MembershipSet, bots: &'a dyn BotDetector, options: ClassifyOptions) -> Self {
        Self { membership, bots, options }
    }

    /// Classify a single issue.
    ///
    /// Rules are applied in order: pull requests are dropped, then issues that
    /// are not closed when a close is required, then `not_planned` issues
    /// (unless unresolved issues are included), then member-authored issues
    /// when members are excluded. The surviving issue is measured; a missing
    /// first response or a negative elapsed time excludes it as well.
    ///
    /// A close is required in resolution mode, and in first-response mode when
    /// only closed issues were requested.
    pub fn classify(&self, issue: &IssueRecord) -> Result<MetricSample, Exclusion> {
        if issue.is_pull_request {
            return Err(Exclusion::PullRequest);
        }

        if issue.closed_at.is_none() && self.requires_close() {
            return Err(Exclusion::NotClosed);
        }

        if !self.options.include_unresolved && issue.state_reason == Some(StateReason::NotPlanned) {
            return Err(Exclusion::NotPlanned);
        }

        let is_member = issue.author.as_ref().is_some_and(|a| self.membership.contains(&a.login));
        if is_member && self.options.view == MembershipView::ExcludeMembers {
            return Err(Exclusion::Member);
        }

        let end = match self.options.metric {
            MetricKind::Resolution => issue.closed_at.ok_or(Exclusion::NotClosed)?,
            MetricKind::FirstResponse => self.first_member_comment_at(issue).ok_or(Exclusion::NoResponse)?,
        };

        let days = elapsed_days(issue.created_at, end);
        if days < 0.0 {
            return Err(Exclusion::NegativeDuration { number: issue.number, days });
        }

        let category = match self.options.view {
            MembershipView::Separate if is_member => Category::Members,
            MembershipView::Separate => Category::External,
            MembershipView::Combined | MembershipView::ExcludeMembers => Category::All,
        };

        Ok(MetricSample {
            number: issue.number,
            category,
            elapsed_days: days,
        })
    }

    /// Classify every record, never stopping on a per-issue problem.
    ///
    /// Records that failed to parse are counted as malformed. Anomalies are
    /// logged as warnings.
    pub fn classify_all<I>(&self, records: I) -> Classification
    where
        I: IntoIterator<Item = Result<IssueRecord, RecordError>>,
    {
        let mut result = Classification::default();

        for record in records {
            result.examined += 1;

            match record.map_err(Exclusion::Malformed).and_then(|issue| self.classify(&issue)) {
                Ok(sample) => result.samples.push(sample),
                Err(exclusion) => {
                    let level = if exclusion.is_anomaly() { log::Level::Warn } else { log::Level::Trace };
                    log::log!(target: LOG_TARGET, level, "Skipping {exclusion}");
                    result.excluded.record(&exclusion);
                }
            }
        }

        log::debug!(
            target: LOG_TARGET,
            "Classified {} record(s): {} sample(s), {} excluded",
            result.examined,
            result.samples.len(),
            result.excluded.total()
        );

        result
    }

    const fn requires_close(&self) -> bool {
        match self.options.metric {
            MetricKind::Resolution => true,
            MetricKind::FirstResponse => matches!(self.options.state, StateFilter::Closed),
        }
    }

    /// Earliest comment written by a member who is not a bot.
    fn first_member_comment_at(&self, issue: &IssueRecord) -> Option<DateTime<Utc>> {
        issue
            .comments
            .iter()
            .filter(|c| {
                c.author
                    .as_ref()
                    .is_some_and(|a| self.membership.contains(&a.login) && !self.bots.is_bot(a))
            })
            .map(|c| c.created_at)
            .min()
    }
}

impl Debug for Classifier<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Classifier")
            .field("membership", &self.membership)
            .field("bots", &"<detector>")
            .field("options", &self.options)
            .finish()
    }
}

#[expect(clippy::cast_precision_loss, reason = "millisecond spans fit comfortably in f64")]
fn elapsed_days(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / MILLIS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Actor, CommentRecord, LoginBotDetector};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn issue(number: u64, author: &str, closed_after: Option<Duration>) -> IssueRecord {
        IssueRecord {
            id: number * 100,
            number,
            created_at: t0(),
            closed_at: closed_after.map(|d| t0() + d),
            state_reason: closed_after.map(|_| StateReason::Completed),
            author: Some(Actor::new(author)),
            is_pull_request: false,
            comments: Vec::new(),
        }
    }

    fn comment(author: Actor, after: Duration) -> CommentRecord {
        CommentRecord {
            author: Some(author),
            created_at: t0() + after,
        }
    }

    fn members() -> MembershipSet {
        ["maintainer", "Helper"].into_iter().collect()
    }

    #[test]
    fn test_resolution_time_in_fractional_days() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let classifier = Classifier::new(&membership, &bots, ClassifyOptions::default());

        let sample = classifier.classify(&issue(1, "user", Some(Duration::hours(36)))).unwrap();
        assert!((sample.elapsed_days - 1.5).abs() < f64::EPSILON);
        assert_eq!(sample.category, Category::All);
        assert_eq!(sample.number, 1);
    }

    #[test]
    fn test_pull_requests_always_excluded() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let mut pr = issue(2, "user", Some(Duration::hours(1)));
        pr.is_pull_request = true;

        for include_unresolved in [false, true] {
            for view in [MembershipView::Combined, MembershipView::Separate, MembershipView::ExcludeMembers] {
                for metric in [MetricKind::Resolution, MetricKind::FirstResponse] {
                    let options = ClassifyOptions {
                        metric,
                        state: StateFilter::All,
                        include_unresolved,
                        view,
                    };
                    let classifier = Classifier::new(&membership, &bots, options);
                    assert_eq!(classifier.classify(&pr), Err(Exclusion::PullRequest));
                }
            }
        }
    }

    #[test]
    fn test_open_issue_excluded_in_resolution_mode() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            state: StateFilter::All,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);
        assert_eq!(classifier.classify(&issue(3, "user", None)), Err(Exclusion::NotClosed));
    }

    #[test]
    fn test_not_planned_excluded_by_default() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let mut record = issue(4, "user", Some(Duration::days(2)));
        record.state_reason = Some(StateReason::NotPlanned);

        let classifier = Classifier::new(&membership, &bots, ClassifyOptions::default());
        assert_eq!(classifier.classify(&record), Err(Exclusion::NotPlanned));

        let options = ClassifyOptions {
            include_unresolved: true,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);
        let sample = classifier.classify(&record).unwrap();
        assert!((sample.elapsed_days - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_other_reasons_included() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let classifier = Classifier::new(&membership, &bots, ClassifyOptions::default());

        for reason in [None, Some(StateReason::Completed), Some(StateReason::Duplicate), Some(StateReason::Other)] {
            let mut record = issue(5, "user", Some(Duration::days(1)));
            record.state_reason = reason;
            assert!(classifier.classify(&record).is_ok(), "reason {reason:?} should be included");
        }
    }

    #[test]
    fn test_exclude_members() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            view: MembershipView::ExcludeMembers,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);

        assert_eq!(classifier.classify(&issue(6, "HELPER", Some(Duration::days(1)))), Err(Exclusion::Member));
        assert_eq!(
            classifier.classify(&issue(7, "outsider", Some(Duration::days(1)))).unwrap().category,
            Category::All
        );
    }

    #[test]
    fn test_separate_members_labels() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            view: MembershipView::Separate,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);

        let sample = classifier.classify(&issue(8, "maintainer", Some(Duration::days(1)))).unwrap();
        assert_eq!(sample.category, Category::Members);

        let sample = classifier.classify(&issue(9, "outsider", Some(Duration::days(1)))).unwrap();
        assert_eq!(sample.category, Category::External);

        let mut ghost = issue(10, "", Some(Duration::days(1)));
        ghost.author = None;
        assert_eq!(classifier.classify(&ghost).unwrap().category, Category::External);
    }

    #[test]
    fn test_negative_duration_is_anomaly() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let classifier = Classifier::new(&membership, &bots, ClassifyOptions::default());

        let record = issue(11, "user", Some(Duration::hours(-12)));
        let err = classifier.classify(&record).unwrap_err();
        assert!(err.is_anomaly());
        assert!(matches!(err, Exclusion::NegativeDuration { number: 11, days } if (days + 0.5).abs() < f64::EPSILON));
        assert_eq!(err.to_string(), "issue #11: it ends 0.50 day(s) before it was created");
        assert!(!Exclusion::NoResponse.is_anomaly());
    }

    #[test]
    fn test_first_response_uses_earliest_member_comment() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            metric: MetricKind::FirstResponse,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);

        let mut record = issue(12, "user", Some(Duration::days(10)));
        record.comments = vec![
            comment(Actor::new("user"), Duration::hours(1)),
            comment(Actor::new("helper"), Duration::hours(48)),
            comment(Actor::new("maintainer"), Duration::hours(12)),
        ];

        let sample = classifier.classify(&record).unwrap();
        assert!((sample.elapsed_days - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_response_ignores_bots() {
        let membership: MembershipSet = ["maintainer", "release-bot[bot]", "ci-app"].into_iter().collect();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            metric: MetricKind::FirstResponse,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);

        let mut record = issue(13, "user", Some(Duration::days(10)));
        record.comments = vec![
            comment(Actor::new("release-bot[bot]"), Duration::hours(1)),
            comment(Actor::bot("ci-app"), Duration::hours(2)),
            comment(Actor::new("maintainer"), Duration::hours(24)),
        ];

        let sample = classifier.classify(&record).unwrap();
        assert!((sample.elapsed_days - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_first_response_without_member_comment() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let options = ClassifyOptions {
            metric: MetricKind::FirstResponse,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);

        let mut record = issue(14, "user", Some(Duration::days(3)));
        record.comments = vec![comment(Actor::new("someone-else"), Duration::hours(1))];
        assert_eq!(classifier.classify(&record), Err(Exclusion::NoResponse));
    }

    #[test]
    fn test_first_response_open_issue_allowed_when_not_closed_only() {
        let membership = members();
        let bots = LoginBotDetector::default();
        let mut record = issue(15, "user", None);
        record.comments = vec![comment(Actor::new("maintainer"), Duration::hours(6))];

        let options = ClassifyOptions {
            metric: MetricKind::FirstResponse,
            state: StateFilter::Open,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);
        let sample = classifier.classify(&record).unwrap();
        assert!((sample.elapsed_days - 0.25).abs() < f64::EPSILON);

        let options = ClassifyOptions {
            metric: MetricKind::FirstResponse,
            state: StateFilter::Closed,
            ..ClassifyOptions::default()
        };
        let classifier = Classifier::new(&membership, &bots, options);
        assert_eq!(classifier.classify(&record), Err(Exclusion::NotClosed));
    }

    #[test]
    fn test_classify_all_tallies_and_partitions() {
        let membership = members();
        let bots = LoginBotDetector::default();

        let mut pr = issue(20, "user", Some(Duration::days(1)));
        pr.is_pull_request = true;
        let mut not_planned = issue(21, "user", Some(Duration::days(1)));
        not_planned.state_reason = Some(StateReason::NotPlanned);

        let records = || {
            vec![
                Ok(issue(22, "maintainer", Some(Duration::days(1)))),
                Ok(issue(23, "outsider", Some(Duration::days(2)))),
                Ok(issue(24, "another", Some(Duration::days(3)))),
                Ok(pr.clone()),
                Ok(not_planned.clone()),
                Ok(issue(25, "user", Some(Duration::days(-1)))),
                Err(RecordError::MissingTimestamp { number: 26, field: "created_at" }),
            ]
        };

        let combined = Classifier::new(&membership, &bots, ClassifyOptions::default()).classify_all(records());
        assert_eq!(combined.examined, 7);
        assert_eq!(combined.samples.len(), 3);
        assert_eq!(combined.excluded.pull_requests, 1);
        assert_eq!(combined.excluded.not_planned, 1);
        assert_eq!(combined.excluded.negative_duration, 1);
        assert_eq!(combined.excluded.malformed, 1);
        assert_eq!(combined.excluded.anomalies(), 2);
        assert_eq!(combined.excluded.total(), 4);

        let options = ClassifyOptions {
            view: MembershipView::Separate,
            ..ClassifyOptions::default()
        };
        let separate = Classifier::new(&membership, &bots, options).classify_all(records());
        let count_in = |c: &Classification, category: Category| c.samples.iter().filter(|s| s.category == category).count();
        let member_count = count_in(&separate, Category::Members);
        let external_count = count_in(&separate, Category::External);
        assert_eq!(member_count, 1);
        assert_eq!(external_count, 2);
        assert_eq!(member_count + external_count, count_in(&combined, Category::All));
    }

    #[test]
    fn test_membership_view_categories() {
        assert_eq!(MembershipView::Combined.categories(), &[Category::All]);
        assert_eq!(MembershipView::ExcludeMembers.categories(), &[Category::All]);
        assert_eq!(MembershipView::Separate.categories(), &[Category::Members, Category::External]);
    }

    #[test]
    fn test_state_filter_display() {
        assert_eq!(StateFilter::Open.to_string(), "open");
        assert_eq!(StateFilter::Closed.to_string(), "closed");
        assert_eq!(StateFilter::All.to_string(), "all");
    }
}
