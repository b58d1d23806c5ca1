use super::ReportData;
use super::report_data::format_count;
use crate::Result;
use crate::analysis::MetricKind;
use crate::stats::{CategoryStats, HistogramBin};
use core::fmt::Write;

const CHART_JS_URL: &str = "https://cdn.jsdelivr.net/npm/chart.js";

/// Card and bar colors, assigned to categories in order.
const SERIES_COLORS: [&str; 4] = ["#667eea", "#f093fb", "#4facfe", "#43e97b"];

pub fn generate<W: Write>(data: &ReportData, writer: &mut W) -> Result<()> {
    let repo = html_escape(&data.repo);
    let metric = data.metric.title();

    writeln!(writer, "<!DOCTYPE html>")?;
    writeln!(writer, "<html>")?;
    writeln!(writer, "<head>")?;
    writeln!(writer, "  <meta charset=\"UTF-8\">")?;
    writeln!(writer, "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(writer, "  <title>GitHub Issue {metric} Analysis - {repo}</title>")?;
    writeln!(writer, "  <script src=\"{CHART_JS_URL}\"></script>")?;
    write_styles(writer)?;
    writeln!(writer, "</head>")?;
    writeln!(writer, "<body>")?;

    write_header(writer, data)?;
    write_summary(writer, data)?;

    writeln!(writer, "  <div class=\"chart-container\">")?;
    if data.histogram.is_empty() {
        writeln!(writer, "    <p class=\"na\">No eligible issues to chart.</p>")?;
    } else {
        writeln!(writer, "    <canvas id=\"histogramChart\"></canvas>")?;
    }
    writeln!(writer, "  </div>")?;

    writeln!(writer, "  <div class=\"stats-grid\">")?;
    for (index, stats) in data.stats.iter().enumerate() {
        write_stats_card(writer, data, stats, series_color(index))?;
    }
    writeln!(writer, "  </div>")?;

    writeln!(writer, "  <p class=\"footer\">Generated by issue-stats {}</p>", env!("CARGO_PKG_VERSION"))?;

    write_scripts(writer, data)?;
    writeln!(writer, "</body>")?;
    writeln!(writer, "</html>")?;
    Ok(())
}

fn write_styles<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "  <style>")?;
    writeln!(writer, "    :root {{")?;
    writeln!(writer, "      --bg-color: #f0f2f5;")?;
    writeln!(writer, "      --card-bg: #ffffff;")?;
    writeln!(writer, "      --text-color: #1a202c;")?;
    writeln!(writer, "      --text-secondary: #64748b;")?;
    writeln!(writer, "      --border-color: #e2e8f0;")?;
    writeln!(writer, "      --accent-color: #3b82f6;")?;
    writeln!(writer, "      --shadow: 0 1px 3px rgba(0,0,0,0.08), 0 4px 16px rgba(0,0,0,0.04);")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    @media (prefers-color-scheme: dark) {{")?;
    writeln!(writer, "      :root {{")?;
    writeln!(writer, "        --bg-color: #0f172a;")?;
    writeln!(writer, "        --card-bg: #1e293b;")?;
    writeln!(writer, "        --text-color: #e2e8f0;")?;
    writeln!(writer, "        --text-secondary: #94a3b8;")?;
    writeln!(writer, "        --border-color: #334155;")?;
    writeln!(writer, "        --accent-color: #60a5fa;")?;
    writeln!(writer, "        --shadow: 0 1px 3px rgba(0,0,0,0.3), 0 4px 16px rgba(0,0,0,0.2);")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    body.dark-theme {{")?;
    writeln!(writer, "      --bg-color: #0f172a; --card-bg: #1e293b; --text-color: #e2e8f0; --text-secondary: #94a3b8;")?;
    writeln!(writer, "      --border-color: #334155; --accent-color: #60a5fa;")?;
    writeln!(writer, "      --shadow: 0 1px 3px rgba(0,0,0,0.3), 0 4px 16px rgba(0,0,0,0.2);")?;
    writeln!(writer, "      color-scheme: dark;")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    body.light-theme {{")?;
    writeln!(writer, "      --bg-color: #f0f2f5; --card-bg: #ffffff; --text-color: #1a202c; --text-secondary: #64748b;")?;
    writeln!(writer, "      --border-color: #e2e8f0; --accent-color: #3b82f6;")?;
    writeln!(writer, "      --shadow: 0 1px 3px rgba(0,0,0,0.08), 0 4px 16px rgba(0,0,0,0.04);")?;
    writeln!(writer, "      color-scheme: light;")?;
    writeln!(writer, "    }}")?;

    writeln!(writer, "    * {{ box-sizing: border-box; }}")?;
    writeln!(writer, "    body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif; margin: 0 auto; max-width: 1200px; padding: 32px; background: var(--bg-color); color: var(--text-color); transition: background-color 0.3s ease, color 0.3s ease; line-height: 1.5; }}")?;

    // Header
    writeln!(writer, "    .header {{ display: flex; align-items: center; gap: 16px; margin-bottom: 28px; }}")?;
    writeln!(writer, "    .header-content {{ flex: 1; }}")?;
    writeln!(writer, "    h1 {{ margin: 0 0 2px 0; font-size: 26px; font-weight: 700; letter-spacing: -0.5px; }}")?;
    writeln!(writer, "    .subtitle {{ margin: 0; font-size: 13px; color: var(--text-secondary); }}")?;
    writeln!(writer, "    .theme-toggle {{ background: none; border: 2px solid var(--border-color); border-radius: 8px; width: 40px; height: 40px; cursor: pointer; display: flex; align-items: center; justify-content: center; transition: all 0.2s ease; flex-shrink: 0; }}")?;
    writeln!(writer, "    .theme-toggle:hover {{ border-color: var(--accent-color); }}")?;
    writeln!(writer, "    .theme-toggle svg {{ width: 18px; height: 18px; fill: var(--text-color); opacity: 0.7; }}")?;

    // Summary box
    writeln!(writer, "    .summary {{ background: var(--card-bg); border-radius: 10px; padding: 16px 20px; box-shadow: var(--shadow); border: 1px solid var(--border-color); border-left: 4px solid var(--accent-color); margin-bottom: 20px; font-size: 14px; }}")?;
    writeln!(writer, "    .summary p {{ margin: 4px 0; }}")?;

    // Chart
    writeln!(writer, "    .chart-container {{ position: relative; height: 400px; background: var(--card-bg); border-radius: 12px; padding: 20px; box-shadow: var(--shadow); border: 1px solid var(--border-color); margin-bottom: 20px; }}")?;

    // Statistic cards
    writeln!(writer, "    .stats-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(300px, 1fr)); gap: 16px; margin-bottom: 20px; }}")?;
    writeln!(writer, "    .stats-card {{ background: var(--card-bg); border-radius: 12px; padding: 16px 20px; box-shadow: var(--shadow); border: 1px solid var(--border-color); border-top: 4px solid var(--card-color); }}")?;
    writeln!(writer, "    .stats-card h3 {{ margin: 0 0 8px 0; font-size: 16px; color: var(--card-color); }}")?;
    writeln!(writer, "    .stat-row {{ display: flex; justify-content: space-between; padding: 4px 0; border-bottom: 1px solid var(--border-color); font-size: 14px; }}")?;
    writeln!(writer, "    .stat-row:last-child {{ border-bottom: none; }}")?;
    writeln!(writer, "    .stat-label {{ color: var(--text-secondary); }}")?;
    writeln!(writer, "    .stat-value {{ font-weight: 600; }}")?;

    // Misc
    writeln!(writer, "    .na {{ color: var(--text-secondary); font-style: italic; font-size: 13px; }}")?;
    writeln!(writer, "    .footer {{ text-align: center; font-size: 12px; color: var(--text-secondary); }}")?;
    writeln!(writer, "    @media (max-width: 640px) {{ body {{ padding: 16px; }} .stats-grid {{ grid-template-columns: 1fr; }} }}")?;
    writeln!(writer, "  </style>")?;
    Ok(())
}

fn write_header<W: Write>(writer: &mut W, data: &ReportData) -> Result<()> {
    let date = data.generated_at.format("%Y-%m-%d").to_string();
    writeln!(writer, "  <div class=\"header\">")?;
    writeln!(writer, "    <div class=\"header-content\">")?;
    writeln!(writer, "      <h1>Issue {} Analysis</h1>", data.metric.title())?;
    writeln!(
        writer,
        "      <p class=\"subtitle\">Repository: {} &middot; Produced by issue-stats {} on {}</p>",
        html_escape(&data.repo),
        env!("CARGO_PKG_VERSION"),
        date
    )?;
    writeln!(writer, "    </div>")?;
    writeln!(writer, "    <button class=\"theme-toggle\" onclick=\"toggleTheme()\" aria-label=\"Toggle theme\">")?;
    writeln!(writer, "      <svg id=\"theme-icon\" viewBox=\"0 0 24 24\"><path d=\"M21 12.79A9 9 0 1 1 11.21 3 7 7 0 0 0 21 12.79z\"/></svg>")?;
    writeln!(writer, "    </button>")?;
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_summary<W: Write>(writer: &mut W, data: &ReportData) -> Result<()> {
    writeln!(writer, "  <div class=\"summary\">")?;
    writeln!(
        writer,
        "    <p>This report measures the time from issue creation to {} for {} issues, in days.</p>",
        match data.metric {
            MetricKind::Resolution => "closure",
            MetricKind::FirstResponse => "the first comment by a repository member",
        },
        data.state
    )?;
    writeln!(
        writer,
        "    <p><strong>{}</strong> entries fetched, <strong>{}</strong> issues analyzed.</p>",
        format_count(data.issues_fetched),
        format_count(data.analyzed())
    )?;
    if let Some(skipped) = super::console::describe_exclusions(&data.excluded) {
        writeln!(writer, "    <p>Skipped: {}.</p>", html_escape(&skipped))?;
    }
    writeln!(writer, "  </div>")?;
    Ok(())
}

fn write_stats_card<W: Write>(writer: &mut W, data: &ReportData, stats: &CategoryStats, color: &str) -> Result<()> {
    writeln!(writer, "    <div class=\"stats-card\" style=\"--card-color: {color};\">")?;
    writeln!(writer, "      <h3>{}</h3>", html_escape(data.series_name(stats.category)))?;
    write_stat_row(writer, "Total Issues", &format_count(stats.count))?;

    if let Some(summary) = stats.summary {
        write_stat_row(writer, "Mean", &format!("{:.1} days", summary.mean))?;
        write_stat_row(writer, "Median", &format!("{:.1} days", summary.median))?;
        write_stat_row(writer, "90th Percentile", &format!("{:.1} days", summary.p90))?;
        write_stat_row(writer, "Range", &format!("{:.1} - {:.1} days", summary.min, summary.max))?;
    } else {
        writeln!(writer, "      <p class=\"na\">No issues in this category</p>")?;
    }

    writeln!(writer, "    </div>")?;
    Ok(())
}

fn write_stat_row<W: Write>(writer: &mut W, label: &str, value: &str) -> Result<()> {
    writeln!(
        writer,
        "      <div class=\"stat-row\"><span class=\"stat-label\">{label}</span><span class=\"stat-value\">{value}</span></div>"
    )?;
    Ok(())
}

fn write_scripts<W: Write>(writer: &mut W, data: &ReportData) -> Result<()> {
    writeln!(writer, "  <script>")?;
    writeln!(writer, "    function getSystemTheme() {{")?;
    writeln!(writer, "      return window.matchMedia('(prefers-color-scheme: dark)').matches ? 'dark' : 'light';")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    function updateIcon(theme) {{")?;
    writeln!(writer, "      const icon = document.getElementById('theme-icon');")?;
    writeln!(writer, "      if (theme === 'dark') {{")?;
    writeln!(writer, "        icon.innerHTML = '<circle cx=\"12\" cy=\"12\" r=\"4\" fill=\"currentColor\"/><path d=\"M12 1v2m0 18v2M4.22 4.22l1.42 1.42m12.72 12.72l1.42 1.42M1 12h2m18 0h2M4.22 19.78l1.42-1.42m12.72-12.72l1.42-1.42\" stroke=\"currentColor\" stroke-width=\"2\" stroke-linecap=\"round\"/>';")?;
    writeln!(writer, "      }} else {{")?;
    writeln!(writer, "        icon.innerHTML = '<path d=\"M21 12.79A9 9 0 1 1 11.21 3 7 7 0 0 0 21 12.79z\"/>';")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    function applyTheme(theme) {{")?;
    writeln!(writer, "      document.body.classList.remove('dark-theme', 'light-theme');")?;
    writeln!(writer, "      document.body.classList.add(theme + '-theme');")?;
    writeln!(writer, "      updateIcon(theme);")?;
    writeln!(writer, "      if (window.histogramChart) {{ styleChart(window.histogramChart); }}")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    function toggleTheme() {{")?;
    writeln!(writer, "      const currentTheme = localStorage.getItem('theme') || getSystemTheme();")?;
    writeln!(writer, "      const newTheme = currentTheme === 'dark' ? 'light' : 'dark';")?;
    writeln!(writer, "      localStorage.setItem('theme', newTheme);")?;
    writeln!(writer, "      applyTheme(newTheme);")?;
    writeln!(writer, "    }}")?;
    writeln!(writer, "    function styleChart(chart) {{")?;
    writeln!(writer, "      const style = getComputedStyle(document.body);")?;
    writeln!(writer, "      const text = style.getPropertyValue('--text-color').trim();")?;
    writeln!(writer, "      const grid = style.getPropertyValue('--border-color').trim();")?;
    writeln!(writer, "      chart.options.plugins.title.color = text;")?;
    writeln!(writer, "      chart.options.plugins.legend.labels.color = text;")?;
    writeln!(writer, "      for (const axis of Object.values(chart.options.scales)) {{")?;
    writeln!(writer, "        axis.title.color = text;")?;
    writeln!(writer, "        axis.ticks.color = text;")?;
    writeln!(writer, "        axis.grid.color = grid;")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "      chart.update();")?;
    writeln!(writer, "    }}")?;

    if !data.histogram.is_empty() {
        write_chart(writer, data)?;
    }

    writeln!(writer, "    const savedTheme = localStorage.getItem('theme');")?;
    writeln!(writer, "    applyTheme(savedTheme || getSystemTheme());")?;
    writeln!(writer, "  </script>")?;
    Ok(())
}

fn write_chart<W: Write>(writer: &mut W, data: &ReportData) -> Result<()> {
    let labels: Vec<String> = data.histogram.bins.iter().map(HistogramBin::label).collect();

    let datasets: Vec<serde_json::Value> = data
        .histogram
        .categories
        .iter()
        .enumerate()
        .map(|(column, &category)| {
            let color = series_color(column);
            let counts: Vec<usize> = data.histogram.bins.iter().map(|bin| bin.counts.get(column).copied().unwrap_or(0)).collect();
            serde_json::json!({
                "label": data.series_name(category),
                "data": counts,
                "backgroundColor": format!("{color}80"),
                "borderColor": color,
                "borderWidth": 2,
                "borderRadius": 4,
            })
        })
        .collect();

    let chart_title = format!("Issue {} Distribution (Histogram)", data.metric.title());
    let x_title = format!("{} (Days)", data.metric.title());

    writeln!(writer, "    const chartData = {{")?;
    writeln!(writer, "      labels: {},", script_json(&labels)?)?;
    writeln!(writer, "      datasets: {}", script_json(&datasets)?)?;
    writeln!(writer, "    }};")?;
    writeln!(writer, "    window.histogramChart = new Chart(document.getElementById('histogramChart').getContext('2d'), {{")?;
    writeln!(writer, "      type: 'bar',")?;
    writeln!(writer, "      data: chartData,")?;
    writeln!(writer, "      options: {{")?;
    writeln!(writer, "        responsive: true,")?;
    writeln!(writer, "        maintainAspectRatio: false,")?;
    writeln!(writer, "        plugins: {{")?;
    writeln!(writer, "          title: {{ display: true, text: {}, font: {{ size: 16 }} }},", script_json(&chart_title)?)?;
    writeln!(writer, "          legend: {{ display: true, position: 'top', labels: {{}} }}")?;
    writeln!(writer, "        }},")?;
    writeln!(writer, "        scales: {{")?;
    writeln!(writer, "          x: {{ title: {{ display: true, text: {} }}, ticks: {{}}, grid: {{}} }},", script_json(&x_title)?)?;
    writeln!(writer, "          y: {{ beginAtZero: true, title: {{ display: true, text: 'Number of Issues' }}, ticks: {{ precision: 0 }}, grid: {{}} }}")?;
    writeln!(writer, "        }}")?;
    writeln!(writer, "      }}")?;
    writeln!(writer, "    }});")?;
    Ok(())
}

const fn series_color(index: usize) -> &'static str {
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// Serialize `value` for embedding inside a `<script>` element.
fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}
