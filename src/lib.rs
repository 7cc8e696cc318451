//! `weather-returns` library crate.
//!
//! The binary (`wxr`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes or touching the network
//! - data sources are swappable behind the `QuoteSource` / `WeatherSource` traits

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod math;
pub mod plot;
pub mod report;
pub mod signal;
pub mod tui;
