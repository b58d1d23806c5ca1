use super::ReportData;
use crate::Result;
use std::io::Write;

/// Bin ranges with one count column per category.
pub fn generate_histogram<W: Write>(data: &ReportData, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["bin_start_days".to_string(), "bin_end_days".to_string()];
    header.extend(data.histogram.categories.iter().map(ToString::to_string));
    csv.write_record(&header)?;

    for bin in &data.histogram.bins {
        let mut record = vec![bin.low.to_string(), bin.high.to_string()];
        record.extend(bin.counts.iter().map(ToString::to_string));
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// One row of summary statistics per category; empty categories leave the statistics blank.
pub fn generate_statistics<W: Write>(data: &ReportData, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["category", "total", "mean", "median", "p90", "min", "max"])?;

    for stats in &data.stats {
        let values = stats.summary.map_or_else(
            || vec![String::new(); 5],
            |s| [s.mean, s.median, s.p90, s.min, s.max].iter().map(|v| format!("{v:.2}")).collect(),
        );

        let mut record = vec![stats.category.to_string(), stats.count.to_string()];
        record.extend(values);
        csv.write_record(&record)?;
    }

    csv.flush()?;
    Ok(())
}

/// One row per measured issue.
pub fn generate_raw_data<W: Write>(data: &ReportData, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["category", "issue_number", "elapsed_days"])?;

    for sample in &data.samples {
        csv.write_record([sample.category.to_string(), sample.number.to_string(), format!("{:.4}", sample.elapsed_days)])?;
    }

    csv.flush()?;
    Ok(())
}
