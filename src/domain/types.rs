//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during the pipeline
//! - exported to CSV/JSON
//! - constructed directly in tests without any provider

use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One trading day's price for the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// One calendar day of provider weather data. Any field may be missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    /// Average air temperature (°C).
    pub tavg: Option<f64>,
    /// Minimum air temperature (°C).
    pub tmin: Option<f64>,
    /// Maximum air temperature (°C).
    pub tmax: Option<f64>,
    /// Daily precipitation total (mm).
    pub prcp: Option<f64>,
}

impl DailyWeather {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Self::default()
        }
    }
}

/// A single metric's value for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Observed value, its calendar-day climatology and the difference.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviationRecord {
    pub date: NaiveDate,
    pub observed: Option<f64>,
    pub historical_avg: Option<f64>,
    pub deviation: Option<f64>,
}

/// A joined, trading-day row that feeds every analysis step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedRecord {
    pub date: NaiveDate,
    pub close: f64,
    pub deviation: f64,
    /// `ln(close_t / close_{t-1})`; `None` on the first row.
    pub log_return: Option<f64>,
}

/// Weather metric used as the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Daily average temperature.
    Tavg,
    /// Daily minimum temperature.
    Tmin,
    /// Daily maximum temperature.
    Tmax,
    /// Daily precipitation.
    Prcp,
}

impl Metric {
    pub fn extract(self, day: &DailyWeather) -> Option<f64> {
        let v = match self {
            Metric::Tavg => day.tavg,
            Metric::Tmin => day.tmin,
            Metric::Tmax => day.tmax,
            Metric::Prcp => day.prcp,
        };
        v.filter(|x| x.is_finite())
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Metric::Tavg => "Temp",
            Metric::Tmin => "Min Temp",
            Metric::Tmax => "Max Temp",
            Metric::Prcp => "Rainfall",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Metric::Tavg | Metric::Tmin | Metric::Tmax => "°C",
            Metric::Prcp => "mm",
        }
    }

    pub fn select(self, days: &[DailyWeather]) -> Vec<WeatherObservation> {
        days.iter()
            .map(|d| WeatherObservation {
                date: d.date,
                value: self.extract(d),
            })
            .collect()
    }
}

/// Price column requested from the quote provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Close,
    #[value(name = "adj-close")]
    AdjClose,
    Open,
    High,
    Low,
}

impl PriceField {
    pub fn display_name(self) -> &'static str {
        match self {
            PriceField::Close => "Close",
            PriceField::AdjClose => "Adj Close",
            PriceField::Open => "Open",
            PriceField::High => "High",
            PriceField::Low => "Low",
        }
    }
}

/// Sampling interval of the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }
}

/// Geographic point for weather queries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Station elevation in meters, used for temperature lapse-rate correction.
    pub elevation_m: f64,
}

/// How the "extreme day" cutoff on `|deviation|` is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum ExtremeThreshold {
    /// Quantile (0..1) of `|deviation|` over the full analysis-period weather series.
    Quantile(f64),
    /// Fixed magnitude in the metric's unit.
    Fixed(f64),
}

impl ExtremeThreshold {
    pub fn describe(&self) -> String {
        match self {
            ExtremeThreshold::Quantile(q) => format!("q{:.0} of |deviation|", q * 100.0),
            ExtremeThreshold::Fixed(x) => format!("fixed {x}"),
        }
    }
}

/// Which rows the regression is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RegressionSample {
    /// Only rows with `|deviation|` above the threshold.
    Extreme,
    /// Every row with a return.
    All,
}

/// Bundled defaults for the two supported analyses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Average temperature, 95th percentile threshold.
    Temperature,
    /// Precipitation, fixed threshold of 5 mm.
    Rainfall,
}

impl Preset {
    pub fn metric(self) -> Metric {
        match self {
            Preset::Temperature => Metric::Tavg,
            Preset::Rainfall => Metric::Prcp,
        }
    }

    pub fn threshold(self) -> ExtremeThreshold {
        match self {
            Preset::Temperature => ExtremeThreshold::Quantile(0.95),
            Preset::Rainfall => ExtremeThreshold::Fixed(5.0),
        }
    }
}

/// Where price and weather data come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Tiingo (prices) and Meteostat (weather) HTTP APIs.
    Live,
    /// Deterministic generated data, no network.
    Synthetic,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub symbol: String,
    pub price_field: PriceField,
    pub interval: Interval,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub location: GeoPoint,
    pub location_name: String,
    /// Number of full calendar years before `start` used for climatology.
    pub reference_years: u32,
    pub metric: Metric,
    pub threshold: ExtremeThreshold,
    pub regression_sample: RegressionSample,
    /// Significance level for the slope test.
    pub alpha: f64,
    pub source: SourceKind,
    pub seed: u64,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub chart: Option<PathBuf>,
    pub export: Option<PathBuf>,
    pub export_summary: Option<PathBuf>,
}

impl AnalysisConfig {
    /// The climatology window: `reference_years` full calendar years ending the
    /// year before `start` (e.g. 2013-01-01..2022-12-31 for a 2023 run).
    pub fn reference_window(&self) -> Result<(NaiveDate, NaiveDate), AppError> {
        let last_year = self.start.year() - 1;
        let first_year = i32::try_from(self.reference_years)
            .ok()
            .and_then(|years| self.start.year().checked_sub(years))
            .ok_or_else(|| {
                AppError::config(format!("Reference window of {} years is out of range.", self.reference_years))
            })?;
        let from = NaiveDate::from_ymd_opt(first_year, 1, 1)
            .ok_or_else(|| AppError::config(format!("Invalid reference start year {first_year}.")))?;
        let to = NaiveDate::from_ymd_opt(last_year, 12, 31)
            .ok_or_else(|| AppError::config(format!("Invalid reference end year {last_year}.")))?;
        Ok((from, to))
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.symbol.trim().is_empty() {
            return Err(AppError::config("Symbol must not be empty."));
        }
        if self.end < self.start {
            return Err(AppError::config(format!(
                "End date {} is before start date {}.",
                self.end, self.start
            )));
        }
        if self.reference_years == 0 {
            return Err(AppError::config("Reference window must cover at least one year."));
        }
        self.reference_window()?;
        if !(-90.0..=90.0).contains(&self.location.latitude)
            || !(-180.0..=180.0).contains(&self.location.longitude)
        {
            return Err(AppError::config("Latitude/longitude out of range."));
        }
        match self.threshold {
            ExtremeThreshold::Quantile(q) if !(q > 0.0 && q < 1.0) => {
                return Err(AppError::config(format!("Threshold quantile must be in (0, 1), got {q}.")));
            }
            ExtremeThreshold::Fixed(x) if !(x.is_finite() && x >= 0.0) => {
                return Err(AppError::config(format!("Fixed threshold must be a finite value >= 0, got {x}.")));
            }
            _ => {}
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AppError::config(format!("Alpha must be in (0, 1), got {}.", self.alpha)));
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::fixtures::config_2023;

    #[test]
    fn reference_window_covers_prior_decade() {
        let config = config_2023();
        let (from, to) = config.reference_window().unwrap();
        assert_eq!(from, NaiveDate::from_ymd_opt(2013, 1, 1).unwrap());
        assert_eq!(to, NaiveDate::from_ymd_opt(2022, 12, 31).unwrap());
    }

    #[test]
    fn validate_rejects_bad_quantile_and_reversed_dates() {
        let mut config = config_2023();
        config.threshold = ExtremeThreshold::Quantile(1.5);
        assert!(config.validate().is_err());

        let mut config = config_2023();
        config.end = NaiveDate::from_ymd_opt(2022, 6, 1).unwrap();
        assert!(config.validate().is_err());

        assert!(config_2023().validate().is_ok());
    }

    #[test]
    fn oversized_reference_window_is_a_config_error() {
        let mut config = config_2023();
        config.reference_years = 2_147_483_648;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
        assert!(config.reference_window().is_err());

        // Fits in i32 but lands before chrono's earliest year.
        config.reference_years = 1_000_000;
        assert_eq!(config.validate().unwrap_err().kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn metric_extract_skips_non_finite() {
        let day = DailyWeather {
            date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            tavg: Some(f64::NAN),
            prcp: Some(2.5),
            ..DailyWeather::default()
        };
        assert_eq!(Metric::Tavg.extract(&day), None);
        assert_eq!(Metric::Prcp.extract(&day), Some(2.5));
    }

    #[test]
    fn presets_carry_their_own_thresholds() {
        assert_eq!(Preset::Temperature.threshold(), ExtremeThreshold::Quantile(0.95));
        assert_eq!(Preset::Rainfall.threshold(), ExtremeThreshold::Fixed(5.0));
        assert_eq!(Preset::Rainfall.metric(), Metric::Prcp);
    }
}
