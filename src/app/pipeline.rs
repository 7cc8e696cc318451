//! Shared analysis pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! prices -> weather (analysis + reference) -> climatology -> deviations ->
//! trading-day alignment -> returns -> statistics
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::analysis::{AnalysisSummary, analyze, with_log_returns};
use crate::data::{
    MeteostatClient, QuoteRequest, QuoteSource, SyntheticSource, TiingoClient, WeatherRequest, WeatherSource,
    densify_daily, normalize_prices,
};
use crate::domain::{AnalysisConfig, CombinedRecord, DailyWeather, DeviationRecord, PricePoint, SourceKind, WeatherObservation};
use crate::error::{AppError, Stage, StageExt};
use crate::signal::{Climatology, align, compute_deviations};

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub prices: Vec<PricePoint>,
    /// Selected metric over the analysis period, one row per calendar day.
    pub weather: Vec<WeatherObservation>,
    pub climatology: Climatology,
    /// Deviation for every analysis-period day (before trading-day restriction).
    pub deviations: Vec<DeviationRecord>,
    /// Trading days dropped for missing weather.
    pub dropped: Vec<NaiveDate>,
    pub combined: Vec<CombinedRecord>,
    pub analysis: AnalysisSummary,
}

/// Provider pair selected by `config.source`.
pub struct Sources {
    pub quotes: Box<dyn QuoteSource>,
    pub weather: Box<dyn WeatherSource>,
}

impl Sources {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AppError> {
        match config.source {
            SourceKind::Live => Ok(Self {
                quotes: Box::new(TiingoClient::from_env().at_stage(Stage::Setup)?),
                weather: Box::new(MeteostatClient::from_env().at_stage(Stage::Setup)?),
            }),
            SourceKind::Synthetic => {
                let source = SyntheticSource::new(config.seed);
                Ok(Self {
                    quotes: Box::new(source.clone()),
                    weather: Box::new(source),
                })
            }
        }
    }
}

/// Execute the full pipeline with live or synthetic sources per config.
pub fn run(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    let sources = Sources::from_config(config)?;
    run_with_sources(config, sources.quotes.as_ref(), sources.weather.as_ref())
}

/// Execute the pipeline against explicit sources.
pub fn run_with_sources(
    config: &AnalysisConfig,
    quotes: &dyn QuoteSource,
    weather: &dyn WeatherSource,
) -> Result<RunOutput, AppError> {
    config.validate().at_stage(Stage::Setup)?;

    // 1) Prices.
    let prices = fetch_prices(config, quotes).at_stage(Stage::MarketFetch)?;

    // 2) Weather for the analysis period and the reference window.
    let analysis_days = fetch_weather(config, weather, config.start, config.end).at_stage(Stage::WeatherFetch)?;
    let climatology = build_climatology(config, weather)?;

    // 3) Deviations over every analysis-period day.
    let observations = config.metric.select(&analysis_days);
    let null_days = observations.iter().filter(|o| o.value.is_none()).count();
    if null_days > 0 {
        info!(null_days, "analysis period has missing weather values");
    }
    let deviations = compute_deviations(&observations, &climatology).at_stage(Stage::Alignment)?;

    // 4) Trading-day restriction, join, null drop, returns.
    let alignment = align(&prices, &deviations).at_stage(Stage::Alignment)?;
    if !alignment.dropped.is_empty() {
        warn!(
            dropped = alignment.dropped.len(),
            "dropped trading days without weather data"
        );
    }
    let combined = with_log_returns(&alignment.rows);

    // 5) Statistics.
    let analysis = analyze(
        &combined,
        &deviations,
        config.threshold,
        config.regression_sample,
        config.alpha,
    )
    .at_stage(Stage::Analysis)?;

    Ok(RunOutput {
        prices,
        weather: observations,
        climatology,
        deviations,
        dropped: alignment.dropped,
        combined,
        analysis,
    })
}

/// Fetch the reference window and reduce it to a calendar-day climatology.
pub fn build_climatology(config: &AnalysisConfig, weather: &dyn WeatherSource) -> Result<Climatology, AppError> {
    let (from, to) = config.reference_window().at_stage(Stage::Setup)?;
    let reference_days = fetch_weather(config, weather, from, to).at_stage(Stage::WeatherFetch)?;
    let climatology =
        Climatology::from_observations(&config.metric.select(&reference_days)).at_stage(Stage::Climatology)?;
    info!(entries = climatology.len(), %from, %to, "built climatology");
    Ok(climatology)
}

fn fetch_prices(config: &AnalysisConfig, quotes: &dyn QuoteSource) -> Result<Vec<PricePoint>, AppError> {
    let request = QuoteRequest {
        symbol: config.symbol.clone(),
        field: config.price_field,
        start: config.start,
        end: config.end,
        interval: config.interval,
    };
    let prices = normalize_prices(quotes.fetch_prices(&request)?, &config.symbol)?;
    info!(source = quotes.name(), n = prices.len(), symbol = %config.symbol, "fetched prices");
    Ok(prices)
}

fn fetch_weather(
    config: &AnalysisConfig,
    weather: &dyn WeatherSource,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<DailyWeather>, AppError> {
    let request = WeatherRequest {
        point: config.location,
        start,
        end,
    };
    let days = densify_daily(weather.fetch_daily(&request)?, start, end)?;
    info!(source = weather.name(), n = days.len(), %start, %end, "fetched weather");
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::config_2023;
    use crate::error::ErrorKind;

    #[test]
    fn synthetic_run_produces_consistent_outputs() {
        let config = config_2023();
        let run = run(&config).unwrap();

        assert!(!run.combined.is_empty());
        assert_eq!(run.weather.len(), 365);
        assert_eq!(run.deviations.len(), 365);
        assert!(run.combined.len() + run.dropped.len() == run.prices.len());
        assert_eq!(run.combined[0].log_return, None);
        assert!(run.combined[1..].iter().all(|r| r.log_return.is_some()));
        // 2013..2022 includes leap years, so Feb 29 is present.
        assert_eq!(run.climatology.len(), 366);
    }

    #[test]
    fn invalid_config_fails_in_setup() {
        let mut config = config_2023();
        config.reference_years = 0;
        let err = run(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert_eq!(err.stage(), Some(Stage::Setup));
    }
}
