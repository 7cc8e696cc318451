//! Command-line parsing for the weather/returns analysis.
//!
//! Argument parsing and command dispatch live apart from the pipeline; this
//! module only describes the flags.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Interval, Metric, Preset, PriceField, RegressionSample, SourceKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "wxr",
    version,
    about = "Does unusual local weather move a stock? Price returns vs weather deviation from climatology."
)]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the full analysis and print the report (default).
    Analyze(AnalyzeArgs),
    /// Print the calendar-day climatology of the reference window.
    Climatology(AnalyzeArgs),
    /// Interactive terminal chart of price vs weather deviation.
    ///
    /// Runs the same pipeline as `wxr analyze` and renders the result with
    /// Ratatui.
    View(AnalyzeArgs),
}

/// Options shared by every command.
#[derive(Debug, Args, Clone)]
pub struct AnalyzeArgs {
    /// Analysis preset: picks the weather metric and extreme-day threshold.
    #[arg(long, value_enum, default_value_t = Preset::Temperature)]
    pub preset: Preset,

    /// Override the preset's weather metric.
    #[arg(long, value_enum)]
    pub metric: Option<Metric>,

    /// Override the threshold with a quantile of |deviation| (0..1).
    #[arg(long, conflicts_with = "threshold_fixed")]
    pub threshold_quantile: Option<f64>,

    /// Override the threshold with a fixed |deviation| in the metric's unit.
    #[arg(long)]
    pub threshold_fixed: Option<f64>,

    /// Instrument symbol (Reuters-style codes such as AAPL.O are accepted).
    #[arg(short, long, default_value = "AAPL.O")]
    pub symbol: String,

    /// Price field to analyze.
    #[arg(long, value_enum, default_value_t = PriceField::Close)]
    pub field: PriceField,

    /// Price sampling interval.
    #[arg(long, value_enum, default_value_t = Interval::Daily)]
    pub interval: Interval,

    /// First day of the analysis period (YYYY-MM-DD).
    #[arg(long, default_value = "2023-01-01")]
    pub start: NaiveDate,

    /// Last day of the analysis period (YYYY-MM-DD).
    #[arg(long, default_value = "2023-12-31")]
    pub end: NaiveDate,

    /// Latitude of the weather location.
    #[arg(long, default_value_t = 49.2497, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude of the weather location.
    #[arg(long, default_value_t = -123.1193, allow_negative_numbers = true)]
    pub lon: f64,

    /// Elevation of the weather location in meters.
    #[arg(long, default_value_t = 70.0, allow_negative_numbers = true)]
    pub elevation: f64,

    /// Display name of the location.
    #[arg(long, default_value = "Vancouver")]
    pub location_name: String,

    /// Full calendar years before the start date used for climatology.
    #[arg(long, default_value_t = 10)]
    pub reference_years: u32,

    /// Rows used for the return-on-deviation regression.
    #[arg(long, value_enum, default_value_t = RegressionSample::Extreme)]
    pub regress_on: RegressionSample,

    /// Significance level for the slope test.
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,

    /// Data source: live APIs (needs TIINGO_API_KEY and METEOSTAT_API_KEY) or synthetic.
    #[arg(long, value_enum, default_value_t = SourceKind::Live)]
    pub source: SourceKind,

    /// Random seed for the synthetic source.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Render an ASCII plot of price and deviation in the terminal.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write a dual-axis SVG chart.
    #[arg(long, value_name = "SVG")]
    pub chart: Option<PathBuf>,

    /// Export the combined per-day dataset to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the statistics summary to JSON.
    #[arg(long = "export-summary", value_name = "JSON")]
    pub export_summary: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::parse_from([
            "wxr",
            "analyze",
            "--preset",
            "rainfall",
            "--threshold-fixed",
            "10",
            "--lon",
            "-0.12",
            "--field",
            "adj-close",
            "-vv",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.preset, Preset::Rainfall);
        assert_eq!(args.threshold_fixed, Some(10.0));
        assert_eq!(args.lon, -0.12);
        assert_eq!(args.field, PriceField::AdjClose);
        assert_eq!(args.start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn threshold_overrides_conflict() {
        let res = Cli::try_parse_from([
            "wxr",
            "analyze",
            "--threshold-fixed",
            "1",
            "--threshold-quantile",
            "0.9",
        ]);
        assert!(res.is_err());
    }
}
