//! End-to-end pipeline runs against in-memory providers.

use chrono::{Datelike, NaiveDate};

use weather_returns::app::pipeline::{build_climatology, run, run_with_sources};
use weather_returns::data::{QuoteRequest, QuoteSource, WeatherRequest, WeatherSource};
use weather_returns::domain::{
    AnalysisConfig, DailyWeather, ExtremeThreshold, GeoPoint, Interval, Metric, PriceField, PricePoint,
    RegressionSample, SourceKind,
};
use weather_returns::error::{AppError, ErrorKind, Stage};
use weather_returns::math::quantile;
use weather_returns::signal::CalendarDay;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

struct FixedQuotes(Vec<PricePoint>);

impl QuoteSource for FixedQuotes {
    fn name(&self) -> &str {
        "fixed"
    }

    fn fetch_prices(&self, _request: &QuoteRequest) -> Result<Vec<PricePoint>, AppError> {
        Ok(self.0.clone())
    }
}

struct RejectingQuotes;

impl QuoteSource for RejectingQuotes {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn fetch_prices(&self, _request: &QuoteRequest) -> Result<Vec<PricePoint>, AppError> {
        Err(AppError::authentication("invalid token"))
    }
}

/// Serves the rows that fall inside each requested window.
struct TableWeather(Vec<DailyWeather>);

impl WeatherSource for TableWeather {
    fn name(&self) -> &str {
        "table"
    }

    fn fetch_daily(&self, request: &WeatherRequest) -> Result<Vec<DailyWeather>, AppError> {
        Ok(self
            .0
            .iter()
            .filter(|r| r.date >= request.start && r.date <= request.end)
            .copied()
            .collect())
    }
}

fn tavg(date: NaiveDate, value: Option<f64>) -> DailyWeather {
    DailyWeather {
        tavg: value,
        ..DailyWeather::empty(date)
    }
}

fn config(start: NaiveDate, end: NaiveDate) -> AnalysisConfig {
    AnalysisConfig {
        symbol: "AAPL.O".to_string(),
        price_field: PriceField::Close,
        interval: Interval::Daily,
        start,
        end,
        location: GeoPoint {
            latitude: 49.2497,
            longitude: -123.1193,
            elevation_m: 70.0,
        },
        location_name: "Vancouver".to_string(),
        reference_years: 1,
        metric: Metric::Tavg,
        threshold: ExtremeThreshold::Fixed(5.0),
        regression_sample: RegressionSample::Extreme,
        alpha: 0.05,
        source: SourceKind::Synthetic,
        seed: 42,
        plot: false,
        plot_width: 80,
        plot_height: 20,
        chart: None,
        export: None,
        export_summary: None,
    }
}

/// Reference year 2022 at a flat 10.0, plus the given analysis-period deviations.
fn weather_with_deviations(days: &[(NaiveDate, Option<f64>)]) -> TableWeather {
    let mut rows: Vec<DailyWeather> = d(2022, 1, 1)
        .iter_days()
        .take_while(|x| *x <= d(2022, 12, 31))
        .map(|x| tavg(x, Some(10.0)))
        .collect();
    rows.extend(days.iter().map(|(date, dev)| tavg(*date, dev.map(|v| 10.0 + v))));
    TableWeather(rows)
}

fn january_prices() -> FixedQuotes {
    FixedQuotes(
        [
            (d(2023, 1, 3), 100.0),
            (d(2023, 1, 4), 102.0),
            (d(2023, 1, 5), 101.0),
            (d(2023, 1, 6), 104.0),
            (d(2023, 1, 9), 103.0),
            (d(2023, 1, 10), 107.0),
        ]
        .map(|(date, close)| PricePoint { date, close })
        .to_vec(),
    )
}

fn january_weather(jan5: Option<f64>) -> TableWeather {
    weather_with_deviations(&[
        (d(2023, 1, 3), Some(1.0)),
        (d(2023, 1, 4), Some(-6.0)),
        (d(2023, 1, 5), jan5),
        (d(2023, 1, 6), Some(7.0)),
        (d(2023, 1, 7), Some(0.0)),
        (d(2023, 1, 8), Some(0.0)),
        (d(2023, 1, 9), Some(-2.0)),
        (d(2023, 1, 10), Some(8.0)),
    ])
}

#[test]
fn fixed_threshold_selects_extreme_days() {
    let cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    let out = run_with_sources(&cfg, &january_prices(), &january_weather(Some(0.5))).unwrap();

    assert_eq!(out.combined.len(), 6);
    assert_eq!(out.combined[0].log_return, None);
    let r = out.combined[1].log_return.unwrap();
    assert!((r - (102.0f64 / 100.0).ln()).abs() < 1e-12);
    assert!((r - 0.0198).abs() < 1e-4);

    assert_eq!(out.analysis.threshold_value, 5.0);
    assert_eq!(out.analysis.extreme_dates, vec![d(2023, 1, 4), d(2023, 1, 6), d(2023, 1, 10)]);
    assert_eq!(out.analysis.regression.n_obs, 3);
    assert_eq!(out.analysis.volatility.n_extreme, 3);
    assert_eq!(out.analysis.volatility.n_normal, 2);
}

#[test]
fn quantile_threshold_includes_non_trading_days() {
    let mut cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    cfg.threshold = ExtremeThreshold::Quantile(0.5);
    cfg.regression_sample = RegressionSample::All;
    // The weekend (Jan 7-8) carries the largest deviations.
    let weather = weather_with_deviations(&[
        (d(2023, 1, 3), Some(1.0)),
        (d(2023, 1, 4), Some(-2.0)),
        (d(2023, 1, 5), Some(3.0)),
        (d(2023, 1, 6), Some(-4.0)),
        (d(2023, 1, 7), Some(9.0)),
        (d(2023, 1, 8), Some(-10.0)),
        (d(2023, 1, 9), Some(5.0)),
        (d(2023, 1, 10), Some(-6.0)),
    ]);
    let out = run_with_sources(&cfg, &january_prices(), &weather).unwrap();

    // |dev| over all eight calendar days: 1 2 3 4 5 6 9 10 -> median 4.5.
    assert!((out.analysis.threshold_value - 4.5).abs() < 1e-12);
    // Over the six trading days alone it would be 3.5.
    let trading: Vec<f64> = out.combined.iter().map(|r| r.deviation.abs()).collect();
    assert_eq!(trading.len(), 6);
    let trading_only = quantile(&trading, 0.5).unwrap();
    assert!((trading_only - 3.5).abs() < 1e-12);
    assert!((out.analysis.threshold_value - trading_only).abs() > 0.5);

    assert_eq!(out.analysis.extreme_dates, vec![d(2023, 1, 9), d(2023, 1, 10)]);
}

#[test]
fn deviation_is_observed_minus_climatology() {
    let cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    let out = run_with_sources(&cfg, &january_prices(), &january_weather(Some(0.5))).unwrap();

    for rec in out.deviations.iter().filter(|r| r.deviation.is_some()) {
        let observed = rec.observed.unwrap();
        let avg = rec.historical_avg.unwrap();
        assert!((rec.deviation.unwrap() - (observed - avg)).abs() < 1e-9);
        assert_eq!(avg, 10.0);
    }

    // Combined dates are trading days with weather, each exactly once.
    let dates: Vec<NaiveDate> = out.combined.iter().map(|r| r.date).collect();
    let mut unique = dates.clone();
    unique.dedup();
    assert_eq!(dates, unique);
    assert!(dates.iter().all(|x| out.prices.iter().any(|p| p.date == *x)));
}

#[test]
fn null_weather_on_trading_day_is_dropped() {
    let cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    let out = run_with_sources(&cfg, &january_prices(), &january_weather(None)).unwrap();

    assert_eq!(out.dropped, vec![d(2023, 1, 5)]);
    assert!(out.combined.iter().all(|r| r.date != d(2023, 1, 5)));
    // The return after the gap spans the dropped day.
    let jan6 = out.combined.iter().find(|r| r.date == d(2023, 1, 6)).unwrap();
    assert!((jan6.log_return.unwrap() - (104.0f64 / 102.0).ln()).abs() < 1e-12);
}

#[test]
fn missing_leap_day_in_reference_is_alignment_error() {
    let cfg = config(d(2024, 2, 27), d(2024, 3, 1));
    let prices = FixedQuotes(
        [(d(2024, 2, 27), 100.0), (d(2024, 2, 28), 101.0), (d(2024, 2, 29), 99.0), (d(2024, 3, 1), 100.5)]
            .map(|(date, close)| PricePoint { date, close })
            .to_vec(),
    );
    let mut rows: Vec<DailyWeather> = d(2023, 1, 1)
        .iter_days()
        .take_while(|x| *x <= d(2023, 12, 31))
        .map(|x| tavg(x, Some(5.0)))
        .collect();
    rows.extend(
        d(2024, 2, 27)
            .iter_days()
            .take_while(|x| *x <= d(2024, 3, 1))
            .map(|x| tavg(x, Some(6.0))),
    );

    let err = run_with_sources(&cfg, &prices, &TableWeather(rows)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Alignment);
    assert_eq!(err.stage(), Some(Stage::Alignment));
    assert!(err.message().contains("02-29"));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn provider_rejection_is_tagged_with_stage() {
    let cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    let err = run_with_sources(&cfg, &RejectingQuotes, &january_weather(Some(0.5))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);
    assert_eq!(err.stage(), Some(Stage::MarketFetch));
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("during market fetch"));
}

#[test]
fn climatology_mean_spans_reference_years() {
    let mut cfg = config(d(2023, 1, 3), d(2023, 1, 10));
    cfg.reference_years = 2;
    let mut rows = Vec::new();
    for date in d(2021, 1, 1).iter_days().take_while(|x| *x <= d(2022, 12, 31)) {
        let value = if date.year() == 2021 { 4.0 } else { 8.0 };
        rows.push(tavg(date, Some(value)));
    }
    // A null in one year leaves the other year's value as the mean.
    rows.iter_mut()
        .filter(|r| r.date == d(2022, 7, 1))
        .for_each(|r| r.tavg = None);

    let clim = build_climatology(&cfg, &TableWeather(rows)).unwrap();
    assert_eq!(clim.lookup(CalendarDay::new(1, 15)).unwrap(), Some(6.0));
    assert_eq!(clim.lookup(CalendarDay::new(7, 1)).unwrap(), Some(4.0));
    assert!(clim.lookup(CalendarDay::new(2, 29)).is_err());
}

#[test]
fn synthetic_runs_are_identical() {
    let mut cfg = config(d(2023, 1, 1), d(2023, 12, 31));
    cfg.reference_years = 10;
    cfg.threshold = ExtremeThreshold::Quantile(0.95);

    let a = run(&cfg).unwrap();
    let b = run(&cfg).unwrap();
    assert_eq!(a.combined, b.combined);
    assert_eq!(a.analysis.regression, b.analysis.regression);
    assert_eq!(a.analysis.extreme_dates, b.analysis.extreme_dates);
}
