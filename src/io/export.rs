//! Exports of the combined dataset (CSV) and the statistics summary (JSON).
//!
//! Both are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::{AnalysisSummary, is_extreme};
use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, CombinedRecord, GeoPoint, Interval, Metric, PriceField};
use crate::error::AppError;

#[derive(Debug, Serialize)]
struct CombinedRow {
    date: NaiveDate,
    close: f64,
    deviation: f64,
    log_return: Option<f64>,
    extreme: bool,
}

/// Write one row per combined trading day. `log_return` is empty on the first row.
pub fn write_combined_csv(path: &Path, records: &[CombinedRecord], threshold: f64) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::io(format!("Failed to create export CSV '{}': {e}", path.display())))?;

    for r in records {
        writer
            .serialize(CombinedRow {
                date: r.date,
                close: r.close,
                deviation: r.deviation,
                log_return: r.log_return,
                extreme: is_extreme(r.deviation, threshold),
            })
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush export CSV '{}': {e}", path.display())))
}

/// Run metadata plus the analysis results.
#[derive(Debug, Serialize)]
pub struct SummaryFile<'a> {
    pub symbol: &'a str,
    pub price_field: PriceField,
    pub interval: Interval,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub location_name: &'a str,
    pub location: GeoPoint,
    pub metric: Metric,
    pub reference_from: NaiveDate,
    pub reference_to: NaiveDate,
    pub n_prices: usize,
    pub n_weather_days: usize,
    pub n_dropped: usize,
    pub analysis: &'a AnalysisSummary,
}

impl<'a> SummaryFile<'a> {
    pub fn new(run: &'a RunOutput, config: &'a AnalysisConfig) -> Self {
        let (reference_from, reference_to) = run.climatology.window();
        Self {
            symbol: &config.symbol,
            price_field: config.price_field,
            interval: config.interval,
            start: config.start,
            end: config.end,
            location_name: &config.location_name,
            location: config.location,
            metric: config.metric,
            reference_from,
            reference_to,
            n_prices: run.prices.len(),
            n_weather_days: run.weather.len(),
            n_dropped: run.dropped.len(),
            analysis: &run.analysis,
        }
    }
}

/// Write the summary as pretty-printed JSON.
pub fn write_summary_json(path: &Path, run: &RunOutput, config: &AnalysisConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &SummaryFile::new(run, config))
        .map_err(|e| AppError::io(format!("Failed to write summary JSON '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| AppError::io(format!("Failed to flush summary JSON '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::config_2023;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("wxr-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn combined_csv_has_header_and_empty_first_return() {
        let path = temp_path("combined.csv");
        let records = [
            CombinedRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 3).unwrap(),
                close: 125.07,
                deviation: 1.5,
                log_return: None,
            },
            CombinedRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 4).unwrap(),
                close: 126.36,
                deviation: 4.0,
                log_return: Some(0.0102),
            },
        ];
        write_combined_csv(&path, &records, 3.0).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,close,deviation,log_return,extreme");
        assert_eq!(lines[1], "2023-01-03,125.07,1.5,,false");
        assert_eq!(lines[2], "2023-01-04,126.36,4.0,0.0102,true");
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn summary_json_carries_run_metadata() {
        let config = config_2023();
        let run = crate::app::pipeline::run(&config).unwrap();
        let path = temp_path("summary.json");
        write_summary_json(&path, &run, &config).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["symbol"], "AAPL.O");
        assert_eq!(value["metric"], "tavg");
        assert_eq!(value["reference_from"], "2013-01-01");
        assert_eq!(value["analysis"]["threshold"]["kind"], "quantile");
        assert!(value["analysis"]["regression"]["slope"]["p_value"].is_number());
        std::fs::remove_file(&path).ok();
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn summary_json_reports_failed_flush() {
        let full = Path::new("/dev/full");
        if !full.exists() {
            return;
        }
        let config = config_2023();
        let run = crate::app::pipeline::run(&config).unwrap();

        // The summary fits in the write buffer, so the device error only shows up on flush.
        let err = write_summary_json(full, &run, &config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
        assert!(err.message().contains("flush"));
    }
}
