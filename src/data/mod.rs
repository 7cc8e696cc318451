//! Data providers.
//!
//! - `tiingo`: end-of-day prices
//! - `meteostat`: daily point weather
//! - `synthetic`: deterministic offline stand-in for both
//!
//! Providers are reached through the `QuoteSource` / `WeatherSource` traits so
//! the pipeline can run against live APIs, generated data or test fixtures.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::domain::{DailyWeather, GeoPoint, Interval, PriceField, PricePoint};
use crate::error::AppError;

pub mod meteostat;
pub mod synthetic;
pub mod tiingo;

pub use meteostat::MeteostatClient;
pub use synthetic::SyntheticSource;
pub use tiingo::TiingoClient;

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub symbol: String,
    pub field: PriceField,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub interval: Interval,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherRequest {
    pub point: GeoPoint,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// A provider of date-indexed instrument prices.
pub trait QuoteSource {
    fn name(&self) -> &str;

    fn fetch_prices(&self, request: &QuoteRequest) -> Result<Vec<PricePoint>, AppError>;
}

/// A provider of daily weather rows for a geographic point.
pub trait WeatherSource {
    fn name(&self) -> &str;

    fn fetch_daily(&self, request: &WeatherRequest) -> Result<Vec<DailyWeather>, AppError>;
}

/// Sort prices by date and check they are usable.
///
/// Duplicate dates are an alignment error; an empty series or a non-positive
/// price means the provider did not deliver what was asked for.
pub fn normalize_prices(mut points: Vec<PricePoint>, symbol: &str) -> Result<Vec<PricePoint>, AppError> {
    if points.is_empty() {
        return Err(AppError::data_unavailable(format!("No prices returned for {symbol}.")));
    }
    points.sort_by_key(|p| p.date);
    if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(AppError::alignment(format!("Duplicate price date {} for {symbol}.", w[0].date)));
    }
    if let Some(bad) = points.iter().find(|p| !(p.close.is_finite() && p.close > 0.0)) {
        return Err(AppError::data_unavailable(format!(
            "Invalid price {} on {} for {symbol}.",
            bad.close, bad.date
        )));
    }
    Ok(points)
}

/// Return exactly one row per calendar day in `[start, end]`.
///
/// Days the provider omitted become all-null rows; rows outside the range are
/// discarded; a repeated date is an alignment error.
pub fn densify_daily(rows: Vec<DailyWeather>, start: NaiveDate, end: NaiveDate) -> Result<Vec<DailyWeather>, AppError> {
    if rows.is_empty() {
        return Err(AppError::data_unavailable(format!("No weather rows returned for {start}..{end}.")));
    }

    let mut by_date: HashMap<NaiveDate, DailyWeather> = HashMap::with_capacity(rows.len());
    for row in rows {
        if row.date < start || row.date > end {
            continue;
        }
        if by_date.insert(row.date, row).is_some() {
            return Err(AppError::alignment(format!("Duplicate weather date {}.", row.date)));
        }
    }

    Ok(start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|d| by_date.get(&d).copied().unwrap_or_else(|| DailyWeather::empty(d)))
        .collect())
}
