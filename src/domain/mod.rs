//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - provider records (`PricePoint`, `DailyWeather`)
//! - derived records (`WeatherObservation`, `DeviationRecord`, `CombinedRecord`)
//! - run configuration (`AnalysisConfig`, `Metric`, `ExtremeThreshold`, ...)

pub mod types;

pub use types::*;
