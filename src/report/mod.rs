//! Terminal reports for the analysis and climatology commands.

pub mod format;

pub use format::{format_climatology, format_regression, format_report, format_run_summary, format_volatility};
