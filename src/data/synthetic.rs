//! Deterministic synthetic prices and weather.
//!
//! Used for offline runs and tests. Output depends only on the seed and the
//! request, so re-running with the same inputs reproduces every value. Weather
//! values are seeded per calendar day, which keeps overlapping requests (the
//! analysis and reference windows) consistent with each other.

use std::collections::hash_map::DefaultHasher;
use std::f64::consts::PI;
use std::hash::{Hash, Hasher};

use chrono::{Datelike, NaiveDate, Weekday};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal};

use crate::data::{QuoteRequest, QuoteSource, WeatherRequest, WeatherSource};
use crate::domain::{DailyWeather, Interval, PricePoint};
use crate::error::AppError;

/// Day of year at which temperature peaks in the northern hemisphere.
const PEAK_DAY: f64 = 200.0;

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    seed: u64,
    start_price: f64,
    /// Mean daily log return.
    drift: f64,
    /// Daily log-return standard deviation.
    daily_vol: f64,
    /// Probability that a weather day is entirely missing.
    missing_prob: f64,
}

impl SyntheticSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            start_price: 125.0,
            drift: 0.0004,
            daily_vol: 0.015,
            missing_prob: 0.02,
        }
    }

    pub fn with_missing_prob(mut self, p: f64) -> Self {
        self.missing_prob = p.clamp(0.0, 1.0);
        self
    }

    fn day_weather(&self, request: &WeatherRequest, date: NaiveDate) -> Result<DailyWeather, AppError> {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        "weather".hash(&mut hasher);
        request.point.latitude.to_bits().hash(&mut hasher);
        request.point.longitude.to_bits().hash(&mut hasher);
        date.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        if rng.gen_bool(self.missing_prob) {
            return Ok(DailyWeather::empty(date));
        }

        let normal =
            Normal::new(0.0, 2.5).map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
        let rain = Exp::new(1.0 / 6.0).map_err(|e| AppError::config(format!("Rain distribution error: {e}")))?;

        let lat = request.point.latitude;
        let season = seasonal_phase(date, lat);
        let base = 25.0 - 0.3 * lat.abs() - 0.0065 * request.point.elevation_m;
        let amplitude = 0.2 * lat.abs();

        let tavg = base + amplitude * season + normal.sample(&mut rng);
        let tmin = tavg - rng.gen_range(2.0..6.0);
        let tmax = tavg + rng.gen_range(2.0..6.0);

        // Wetter in the cold season.
        let wet_prob = (0.35 - 0.2 * season).clamp(0.05, 0.95);
        let prcp = if rng.gen_bool(wet_prob) { rain.sample(&mut rng) } else { 0.0 };

        Ok(DailyWeather {
            date,
            tavg: Some(round1(tavg)),
            tmin: Some(round1(tmin)),
            tmax: Some(round1(tmax)),
            prcp: Some(round1(prcp)),
        })
    }
}

impl QuoteSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_prices(&self, request: &QuoteRequest) -> Result<Vec<PricePoint>, AppError> {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        request.symbol.hash(&mut hasher);
        request.start.hash(&mut hasher);
        request.end.hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());

        let normal = Normal::new(self.drift, self.daily_vol)
            .map_err(|e| AppError::config(format!("Return distribution error: {e}")))?;

        let mut price = self.start_price;
        let mut daily = Vec::new();
        for date in request.start.iter_days().take_while(|d| *d <= request.end) {
            if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                continue;
            }
            if !daily.is_empty() {
                price *= normal.sample(&mut rng).exp();
            }
            daily.push(PricePoint {
                date,
                close: (price * 100.0).round() / 100.0,
            });
        }

        Ok(resample(daily, request.interval))
    }
}

impl WeatherSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch_daily(&self, request: &WeatherRequest) -> Result<Vec<DailyWeather>, AppError> {
        request
            .start
            .iter_days()
            .take_while(|d| *d <= request.end)
            .map(|d| self.day_weather(request, d))
            .collect()
    }
}

/// +1 at the local warm peak, -1 half a year later.
fn seasonal_phase(date: NaiveDate, latitude: f64) -> f64 {
    let doy = date.ordinal() as f64;
    let phase = (2.0 * PI * (doy - PEAK_DAY) / 365.25).cos();
    if latitude < 0.0 { -phase } else { phase }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Keep the last trading day of each week or month.
fn resample(points: Vec<PricePoint>, interval: Interval) -> Vec<PricePoint> {
    let bucket = |d: NaiveDate| -> (i32, u32) {
        match interval {
            Interval::Daily => (d.year(), d.ordinal()),
            Interval::Weekly => (d.iso_week().year(), d.iso_week().week()),
            Interval::Monthly => (d.year(), d.month()),
        }
    };

    let mut out: Vec<PricePoint> = Vec::with_capacity(points.len());
    for p in points {
        match out.last_mut() {
            Some(last) if bucket(last.date) == bucket(p.date) => *last = p,
            _ => out.push(p),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GeoPoint, PriceField};

    fn quote_request(interval: Interval) -> QuoteRequest {
        QuoteRequest {
            symbol: "AAPL.O".to_string(),
            field: PriceField::Close,
            start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            interval,
        }
    }

    fn weather_request() -> WeatherRequest {
        WeatherRequest {
            point: GeoPoint {
                latitude: 49.2497,
                longitude: -123.1193,
                elevation_m: 70.0,
            },
            start: NaiveDate::from_ymd_opt(2022, 12, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2023, 2, 28).unwrap(),
        }
    }

    #[test]
    fn prices_are_weekday_only_and_deterministic() {
        let source = SyntheticSource::new(7);
        let a = source.fetch_prices(&quote_request(Interval::Daily)).unwrap();
        let b = source.fetch_prices(&quote_request(Interval::Daily)).unwrap();
        assert_eq!(a, b);
        assert!(a.iter().all(|p| !matches!(p.date.weekday(), Weekday::Sat | Weekday::Sun)));
        assert!(a.iter().all(|p| p.close > 0.0));
        // Jan 2 2023 is the first weekday.
        assert_eq!(a[0].date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
    }

    #[test]
    fn monthly_resample_keeps_month_end() {
        let source = SyntheticSource::new(7);
        let monthly = source.fetch_prices(&quote_request(Interval::Monthly)).unwrap();
        let dates: Vec<NaiveDate> = monthly.iter().map(|p| p.date).collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2023, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2023, 2, 28).unwrap(),
                NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            ]
        );
    }

    #[test]
    fn weather_is_dense_and_consistent_across_windows() {
        let source = SyntheticSource::new(7);
        let full = source.fetch_daily(&weather_request()).unwrap();
        assert_eq!(full.len(), 31 + 31 + 28);

        let mut narrow = weather_request();
        narrow.start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let part = source.fetch_daily(&narrow).unwrap();
        assert_eq!(part[0], full[31]);
    }

    #[test]
    fn missing_prob_one_gives_all_nulls() {
        let source = SyntheticSource::new(7).with_missing_prob(1.0);
        let rows = source.fetch_daily(&weather_request()).unwrap();
        assert!(rows.iter().all(|r| r.tavg.is_none() && r.prcp.is_none()));
    }
}
