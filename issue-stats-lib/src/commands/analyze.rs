//! The analysis workflow: fetch, classify, summarize, report.

use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use super::{Host, ProgressReporter};
use crate::Result;
use crate::analysis::{Classifier, ClassifyOptions, IssueRecord, LoginBotDetector, MembershipSet, MembershipView, MetricKind, StateFilter};
use crate::github::{Issue, Progress, Provider, RepoSpec};
use crate::reports::{
    ReportData, generate_console, generate_histogram_csv, generate_html, generate_json, generate_raw_data_csv, generate_statistics_csv,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::Local;
use clap::Args;
use core::time::Duration;
use ohno::{IntoAppError, bail};
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "   analyze";

/// Arguments controlling a single analysis run
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Repository to analyze, as `owner/repo` or a GitHub URL
    #[arg(value_name = "REPOSITORY", value_parser = parse_repo)]
    pub repo: RepoSpec,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Which issues to fetch
    #[arg(long, value_name = "STATE", default_value_t = StateFilter::Closed)]
    pub state: StateFilter,

    /// Number of issues requested per page
    #[arg(long, value_name = "N", default_value_t = 100, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub per_page: u8,

    /// Report issues opened by repository members and by external users separately
    #[arg(long, conflicts_with = "exclude_members", help_heading = "Analysis")]
    pub separate_members: bool,

    /// Only analyze issues opened by external users
    #[arg(long, help_heading = "Analysis")]
    pub exclude_members: bool,

    /// Measure the time until the first comment by a repository member instead of the time until closure
    #[arg(long, help_heading = "Analysis")]
    pub first_response: bool,

    /// Also count issues closed as not planned
    #[arg(long, help_heading = "Analysis")]
    pub include_unresolved: bool,

    /// Write an HTML report with a histogram, plus companion CSV files
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub html: Option<Utf8PathBuf>,

    /// Write the results as JSON
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub json: Option<Utf8PathBuf>,

    /// Path to configuration file (default is `issue-stats.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    pub log_level: LogLevel,
}

impl AnalyzeArgs {
    fn options(&self) -> ClassifyOptions {
        ClassifyOptions {
            metric: if self.first_response {
                MetricKind::FirstResponse
            } else {
                MetricKind::Resolution
            },
            state: self.state,
            include_unresolved: self.include_unresolved,
            view: if self.separate_members {
                MembershipView::Separate
            } else if self.exclude_members {
                MembershipView::ExcludeMembers
            } else {
                MembershipView::Combined
            },
        }
    }
}

fn parse_repo(text: &str) -> Result<RepoSpec, String> {
    RepoSpec::parse(text).map_err(|e| format!("{e:#}"))
}

/// Run one analysis and write every requested report.
///
/// # Errors
///
/// Fails on a missing or rejected token, an unknown repository, an impossible
/// combination of options, a report that cannot be written, or when no issue
/// was eligible for analysis. In the last case the summary is printed first.
pub async fn analyze<H: Host>(host: &mut H, args: &AnalyzeArgs) -> Result<()> {
    init_logging(args.log_level);

    let base_dir = std::env::current_dir().into_app_err("determining the current directory")?;
    let base_dir = Utf8PathBuf::try_from(base_dir).into_app_err("the current directory is not valid UTF-8")?;
    let config = Config::load(&base_dir, args.config.as_ref())?;

    let options = args.options();
    if options.metric == MetricKind::Resolution && options.state == StateFilter::Open {
        bail!("open issues have no resolution time: use '--state closed' or '--state all', or add '--first-response'");
    }

    let Some(token) = args.token.as_deref().filter(|t| !t.trim().is_empty()) else {
        bail!("authentication failed: a GitHub token is required, pass '--token' or set GITHUB_TOKEN");
    };

    let delay = if matches!(args.log_level, LogLevel::None | LogLevel::Error | LogLevel::Warn) {
        Duration::from_millis(300)
    } else {
        Duration::from_hours(365 * 24)
    };
    let progress = ProgressReporter::new(delay, args.color.enabled_for(&std::io::stderr()));

    let provider = Provider::new(token, config.provider_settings())?;
    let fetched = fetch(&provider, &args.repo, &options, args.per_page, &progress).await;
    progress.done();
    let (issues, membership) = fetched?;

    let bots = LoginBotDetector::new(&config.bot_login_suffixes, &config.bot_logins);
    let classifier = Classifier::new(&membership, &bots, options);
    let classification = classifier.classify_all(issues.iter().map(IssueRecord::try_from));

    let data = ReportData::new(args.repo.to_string(), &options, classification, config.histogram_bin_days, Local::now())?;
    log::info!(target: LOG_TARGET, "{} of {} fetched issue(s) are eligible", data.analyzed(), data.issues_fetched);

    let anomalies = data.excluded.anomalies();
    if anomalies > 0 && args.log_level == LogLevel::None {
        writeln!(host.error(), "warning: skipped {anomalies} issue(s) with missing or inconsistent timestamps")?;
    }

    let mut console = String::new();
    generate_console(&data, args.color.enabled_for(&std::io::stdout()), &mut console)?;
    host.output().write_all(console.as_bytes())?;

    if let Some(path) = &args.html {
        write_html_reports(host, &data, path)?;
    }

    if let Some(path) = &args.json {
        let mut json = String::new();
        generate_json(&data, &mut json)?;
        fs::write(path, json).into_app_err_with(|| format!("writing JSON report to '{path}'"))?;
        writeln!(host.output(), "JSON report saved to {path}")?;
    }

    if data.analyzed() == 0 {
        bail!("no eligible issues found in repository '{}'", args.repo);
    }

    Ok(())
}

/// Fetch the issues plus whatever membership and comment data the options need.
async fn fetch(
    provider: &Provider,
    repo: &RepoSpec,
    options: &ClassifyOptions,
    per_page: u8,
    progress: &dyn Progress,
) -> Result<(Vec<Issue>, MembershipSet)> {
    let mut issues = provider.get_issues(repo, options.state, per_page, progress).await?;

    let needs_members = options.view != MembershipView::Combined || options.metric == MetricKind::FirstResponse;
    let membership = if needs_members {
        provider.get_collaborators(repo, progress).await
    } else {
        MembershipSet::new()
    };

    if options.metric == MetricKind::FirstResponse {
        provider.attach_comments(repo, &mut issues, progress).await?;
    }

    Ok((issues, membership))
}

/// Write the HTML page and its three companion CSV files next to it.
fn write_html_reports<H: Host>(host: &mut H, data: &ReportData, path: &Utf8Path) -> Result<()> {
    let mut html = String::new();
    generate_html(data, &mut html)?;
    fs::write(path, html).into_app_err_with(|| format!("writing HTML report to '{path}'"))?;
    writeln!(host.output(), "HTML report saved to {path}")?;

    let [histogram, statistics, raw_data] = companion_paths(path);
    for (csv_path, generate) in [
        (histogram, generate_histogram_csv as fn(&ReportData, fs::File) -> Result<()>),
        (statistics, generate_statistics_csv),
        (raw_data, generate_raw_data_csv),
    ] {
        let file = fs::File::create(&csv_path).into_app_err_with(|| format!("creating CSV report '{csv_path}'"))?;
        generate(data, file)?;
        writeln!(host.output(), "CSV data saved to {csv_path}")?;
    }

    Ok(())
}

/// `<stem>_histogram.csv`, `<stem>_statistics.csv` and `<stem>_raw_data.csv` beside `html_path`.
fn companion_paths(html_path: &Utf8Path) -> [Utf8PathBuf; 3] {
    let stem = html_path.file_stem().unwrap_or("report");
    let dir = html_path.parent().unwrap_or_else(|| Utf8Path::new(""));
    ["histogram", "statistics", "raw_data"].map(|suffix| dir.join(format!("{stem}_{suffix}.csv")))
}
