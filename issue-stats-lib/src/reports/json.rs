use super::ReportData;
use crate::Result;
use core::fmt::Write;
use serde_json::json;

#[expect(unused_results, reason = "Map::insert never replaces an existing key here")]
pub fn generate<W: Write>(data: &ReportData, writer: &mut W) -> Result<()> {
    let mut categories = Vec::with_capacity(data.stats.len());
    for stats in &data.stats {
        let mut category = serde_json::Map::new();
        category.insert("category".to_string(), json!(stats.category));
        category.insert("name".to_string(), json!(data.series_name(stats.category)));
        category.insert("count".to_string(), json!(stats.count));
        category.insert("statistics".to_string(), json!(stats.summary));
        categories.push(json!(category));
    }

    let histogram = json!({
        "bin_days": data.histogram.bin_days,
        "categories": data.histogram.categories,
        "bins": data.histogram.bins.iter().map(|bin| json!({
            "start_days": bin.low,
            "end_days": bin.high,
            "counts": bin.counts,
        })).collect::<Vec<_>>(),
    });

    let output = json!({
        "repository": data.repo,
        "generated_at": data.generated_at.to_rfc3339(),
        "tool_version": env!("CARGO_PKG_VERSION"),
        "metric": data.metric,
        "state": data.state,
        "view": data.view,
        "issues_fetched": data.issues_fetched,
        "issues_analyzed": data.analyzed(),
        "excluded": data.excluded,
        "categories": categories,
        "histogram": histogram,
        "samples": data.samples,
    });

    write!(writer, "{}", serde_json::to_string_pretty(&output)?)?;
    Ok(())
}
