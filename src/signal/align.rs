//! Trading-day restriction and date join.
//!
//! The weather series is daily (weekends and holidays included) while prices
//! exist only on trading days. Alignment is explicit:
//!
//! 1. restrict the deviation series to exactly the price dates, in price order,
//!    failing on duplicate weather dates or on a price date with no weather row
//! 2. merge-join both sides on the (ascending) date key
//! 3. drop rows with a null deviation

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::{DeviationRecord, PricePoint};
use crate::error::AppError;

/// A trading day with both a price and a non-null deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JoinedRow {
    pub date: NaiveDate,
    pub close: f64,
    pub deviation: f64,
}

/// Output of the alignment stage.
#[derive(Debug, Clone)]
pub struct Alignment {
    pub rows: Vec<JoinedRow>,
    /// Trading days dropped because the weather side was null.
    pub dropped: Vec<NaiveDate>,
}

/// Select the deviation rows for each price date, preserving price order.
pub fn restrict_to_trading_days(
    deviations: &[DeviationRecord],
    prices: &[PricePoint],
) -> Result<Vec<DeviationRecord>, AppError> {
    let mut index: HashMap<NaiveDate, &DeviationRecord> = HashMap::with_capacity(deviations.len());
    for rec in deviations {
        if index.insert(rec.date, rec).is_some() {
            return Err(AppError::alignment(format!("Duplicate weather date {}.", rec.date)));
        }
    }

    let missing: Vec<NaiveDate> = prices
        .iter()
        .map(|p| p.date)
        .filter(|d| !index.contains_key(d))
        .collect();
    if let Some(first) = missing.first() {
        return Err(AppError::alignment(format!(
            "{} trading day(s) have no weather row (first: {first}).",
            missing.len()
        )));
    }

    Ok(prices.iter().filter_map(|p| index.get(&p.date).map(|r| **r)).collect())
}

/// Inner merge-join on date. Both inputs must be strictly ascending.
pub fn merge_join(
    prices: &[PricePoint],
    weather: &[DeviationRecord],
) -> Result<Vec<(PricePoint, DeviationRecord)>, AppError> {
    ensure_strictly_ascending(prices.iter().map(|p| p.date), "price")?;
    ensure_strictly_ascending(weather.iter().map(|w| w.date), "weather")?;

    let mut out = Vec::with_capacity(prices.len().min(weather.len()));
    let (mut i, mut j) = (0, 0);
    while i < prices.len() && j < weather.len() {
        match prices[i].date.cmp(&weather[j].date) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((prices[i], weather[j]));
                i += 1;
                j += 1;
            }
        }
    }
    Ok(out)
}

/// Restrict, join and drop nulls. Fails when nothing survives.
pub fn align(prices: &[PricePoint], deviations: &[DeviationRecord]) -> Result<Alignment, AppError> {
    let restricted = restrict_to_trading_days(deviations, prices)?;
    let joined = merge_join(prices, &restricted)?;

    let mut rows = Vec::with_capacity(joined.len());
    let mut dropped = Vec::new();
    for (price, weather) in joined {
        match weather.deviation {
            Some(deviation) if price.close.is_finite() => rows.push(JoinedRow {
                date: price.date,
                close: price.close,
                deviation,
            }),
            _ => dropped.push(price.date),
        }
    }

    debug!(joined = rows.len() + dropped.len(), dropped = dropped.len(), "aligned price and weather series");

    if rows.is_empty() {
        return Err(AppError::alignment(
            "No overlapping trading days with complete price and weather data.",
        ));
    }

    Ok(Alignment { rows, dropped })
}

fn ensure_strictly_ascending(dates: impl Iterator<Item = NaiveDate>, side: &str) -> Result<(), AppError> {
    let mut prev: Option<NaiveDate> = None;
    for d in dates {
        if let Some(p) = prev {
            if d <= p {
                return Err(AppError::alignment(format!(
                    "{side} dates are not strictly ascending at {d} (after {p})."
                )));
            }
        }
        prev = Some(d);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).unwrap()
    }

    fn price(m: u32, d: u32, close: f64) -> PricePoint {
        PricePoint { date: date(m, d), close }
    }

    fn dev(m: u32, d: u32, deviation: Option<f64>) -> DeviationRecord {
        DeviationRecord {
            date: date(m, d),
            observed: deviation,
            historical_avg: Some(0.0),
            deviation,
        }
    }

    #[test]
    fn restriction_keeps_only_trading_days_in_price_order() {
        // Jan 7/8 2023 are a weekend.
        let devs = vec![
            dev(1, 5, Some(1.0)),
            dev(1, 6, Some(2.0)),
            dev(1, 7, Some(3.0)),
            dev(1, 8, Some(4.0)),
            dev(1, 9, Some(5.0)),
        ];
        let prices = vec![price(1, 5, 10.0), price(1, 6, 11.0), price(1, 9, 12.0)];

        let out = restrict_to_trading_days(&devs, &prices).unwrap();
        let dates: Vec<NaiveDate> = out.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1, 5), date(1, 6), date(1, 9)]);
    }

    #[test]
    fn duplicate_weather_date_is_rejected() {
        let devs = vec![dev(1, 5, Some(1.0)), dev(1, 5, Some(2.0))];
        let prices = vec![price(1, 5, 10.0)];
        let err = restrict_to_trading_days(&devs, &prices).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Alignment);
    }

    #[test]
    fn missing_weather_label_is_rejected() {
        let devs = vec![dev(1, 5, Some(1.0))];
        let prices = vec![price(1, 5, 10.0), price(1, 6, 11.0)];
        let err = restrict_to_trading_days(&devs, &prices).unwrap_err();
        assert!(err.message().contains("2023-01-06"));
    }

    #[test]
    fn merge_join_is_inner() {
        let prices = vec![price(1, 3, 1.0), price(1, 4, 2.0), price(1, 6, 3.0)];
        let weather = vec![dev(1, 4, Some(0.5)), dev(1, 5, Some(0.1)), dev(1, 6, Some(0.2))];
        let out = merge_join(&prices, &weather).unwrap();
        let dates: Vec<NaiveDate> = out.iter().map(|(p, _)| p.date).collect();
        assert_eq!(dates, vec![date(1, 4), date(1, 6)]);
    }

    #[test]
    fn merge_join_rejects_unsorted_input() {
        let prices = vec![price(1, 4, 1.0), price(1, 3, 2.0)];
        assert!(merge_join(&prices, &[]).is_err());
    }

    #[test]
    fn null_weather_on_trading_day_is_dropped_not_imputed() {
        let devs = vec![dev(1, 3, Some(1.0)), dev(1, 4, None), dev(1, 5, Some(-1.0))];
        let prices = vec![price(1, 3, 100.0), price(1, 4, 101.0), price(1, 5, 102.0)];

        let aligned = align(&prices, &devs).unwrap();
        let dates: Vec<NaiveDate> = aligned.rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(1, 3), date(1, 5)]);
        assert_eq!(aligned.dropped, vec![date(1, 4)]);
    }

    #[test]
    fn all_null_weather_is_an_alignment_error() {
        let devs = vec![dev(1, 3, None)];
        let prices = vec![price(1, 3, 100.0)];
        assert!(align(&prices, &devs).is_err());
    }
}
