use super::ReportData;
use super::report_data::format_count;
use crate::Result;
use crate::analysis::{Category, ExclusionTally, MembershipView};
use crate::stats::CategoryStats;
use core::fmt::Write;
use owo_colors::OwoColorize;

const RULE_WIDTH: usize = 60;

pub fn generate<W: Write>(data: &ReportData, use_colors: bool, writer: &mut W) -> Result<()> {
    let repo = if use_colors {
        data.repo.cyan().bold().to_string()
    } else {
        data.repo.clone()
    };

    writeln!(writer, "Repository: {repo}")?;
    writeln!(writer, "Total issues fetched: {}", format_count(data.issues_fetched))?;

    if let Some(skipped) = describe_exclusions(&data.excluded) {
        writeln!(writer, "Skipped: {skipped}")?;
    }

    if data.view == MembershipView::Separate {
        writeln!(writer, "Member issues: {}", format_count(count_of(data, Category::Members)))?;
        writeln!(writer, "External issues: {}", format_count(count_of(data, Category::External)))?;
    }

    for stats in &data.stats {
        writeln!(writer)?;
        write_block(writer, data, stats, use_colors)?;
    }

    Ok(())
}

fn write_block<W: Write>(writer: &mut W, data: &ReportData, stats: &CategoryStats, use_colors: bool) -> Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    let title = data.section_title(stats.category);
    let metric = data.metric.title().to_uppercase();

    writeln!(writer, "{rule}")?;
    if use_colors {
        writeln!(writer, "{}", title.bold())?;
    } else {
        writeln!(writer, "{title}")?;
    }
    writeln!(writer, "{rule}")?;

    let count = format_count(stats.count);
    if use_colors {
        writeln!(writer, "Total Issues Analyzed: {}", count.green().bold())?;
    } else {
        writeln!(writer, "Total Issues Analyzed: {count}")?;
    }

    let Some(summary) = stats.summary else {
        writeln!(writer)?;
        writeln!(writer, "No issues in this category.")?;
        writeln!(writer, "{rule}")?;
        return Ok(());
    };

    writeln!(writer)?;
    writeln!(writer, "{metric} STATISTICS (in days):")?;
    writeln!(writer, "  Mean:     {:.2}", summary.mean)?;
    writeln!(writer, "  Median:   {:.2}", summary.median)?;
    writeln!(writer, "  Min:      {:.2}", summary.min)?;
    writeln!(writer, "  Max:      {:.2}", summary.max)?;
    writeln!(writer, "  Std Dev:  {:.2}", summary.std_dev)?;
    writeln!(writer)?;
    writeln!(writer, "PERCENTILES (in days):")?;
    writeln!(writer, "  25th:     {:.2}", summary.p25)?;
    writeln!(writer, "  75th:     {:.2}", summary.p75)?;
    writeln!(writer, "  90th:     {:.2}", summary.p90)?;
    writeln!(writer, "  95th:     {:.2}", summary.p95)?;
    writeln!(writer, "{rule}")?;

    Ok(())
}

fn count_of(data: &ReportData, category: Category) -> usize {
    data.stats.iter().find(|s| s.category == category).map_or(0, |s| s.count)
}

/// One-line summary of the non-zero exclusion counts, if any.
pub(super) fn describe_exclusions(tally: &ExclusionTally) -> Option<String> {
    let parts: Vec<_> = [
        (tally.pull_requests, "pull requests"),
        (tally.not_closed, "not closed"),
        (tally.not_planned, "closed as not planned"),
        (tally.members, "opened by members"),
        (tally.no_response, "without a member response"),
        (tally.malformed, "malformed"),
        (tally.negative_duration, "with a negative duration"),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, label)| format!("{} {label}", format_count(count)))
    .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}
