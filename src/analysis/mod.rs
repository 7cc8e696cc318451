//! Statistics over the combined dataset: returns, extreme-day split,
//! regression and volatility comparison.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::domain::{CombinedRecord, DeviationRecord, ExtremeThreshold, RegressionSample};
use crate::error::AppError;

pub mod regression;
pub mod returns;
pub mod threshold;
pub mod volatility;

pub use regression::{Coefficient, RegressionSummary, regress_returns};
pub use returns::with_log_returns;
pub use threshold::{is_extreme, resolve_threshold, split_extreme};
pub use volatility::{VolatilityComparison, VolatilityVerdict, compare_volatility};

/// Everything computed from the combined dataset in one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisSummary {
    pub threshold: ExtremeThreshold,
    /// Resolved cutoff on `|deviation|`.
    pub threshold_value: f64,
    pub n_rows: usize,
    pub extreme_dates: Vec<NaiveDate>,
    pub regression_sample: RegressionSample,
    pub regression: RegressionSummary,
    pub volatility: VolatilityComparison,
}

/// Run the extreme-day split, regression and volatility comparison.
///
/// `full_deviations` is the analysis-period deviation series before the
/// trading-day restriction; quantile thresholds are taken over it.
pub fn analyze(
    combined: &[CombinedRecord],
    full_deviations: &[DeviationRecord],
    threshold: ExtremeThreshold,
    regression_sample: RegressionSample,
    alpha: f64,
) -> Result<AnalysisSummary, AppError> {
    let threshold_value = resolve_threshold(threshold, full_deviations)?;
    let (extreme, _normal) = split_extreme(combined, threshold_value);
    info!(
        threshold = threshold_value,
        extreme = extreme.len(),
        rows = combined.len(),
        "split extreme days"
    );

    let sample: &[CombinedRecord] = match regression_sample {
        RegressionSample::Extreme => &extreme,
        RegressionSample::All => combined,
    };
    let pairs: Vec<(f64, f64)> = sample
        .iter()
        .filter_map(|r| r.log_return.map(|ret| (r.deviation, ret)))
        .collect();
    let regression = regress_returns(&pairs, alpha)?;
    info!(
        slope = regression.slope.estimate,
        p_value = regression.slope.p_value,
        r_squared = regression.r_squared,
        n = regression.n_obs,
        "fitted return-on-deviation regression"
    );

    let volatility = compare_volatility(combined, threshold_value);

    Ok(AnalysisSummary {
        threshold,
        threshold_value,
        n_rows: combined.len(),
        extreme_dates: extreme.iter().map(|r| r.date).collect(),
        regression_sample,
        regression,
        volatility,
    })
}
