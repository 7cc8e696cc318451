//! Extreme-day threshold and the extreme/normal split.

use crate::domain::{CombinedRecord, DeviationRecord, ExtremeThreshold};
use crate::error::AppError;
use crate::math::quantile;
use crate::signal::abs_deviations;

/// Resolve the cutoff on `|deviation|`.
///
/// A quantile threshold is computed over the full analysis-period deviation
/// series (weekends and holidays included), not over the joined subset.
pub fn resolve_threshold(threshold: ExtremeThreshold, deviations: &[DeviationRecord]) -> Result<f64, AppError> {
    match threshold {
        ExtremeThreshold::Fixed(x) => Ok(x),
        ExtremeThreshold::Quantile(q) => quantile(&abs_deviations(deviations), q)
            .ok_or_else(|| AppError::data_unavailable("No non-null deviations to compute a quantile threshold.")),
    }
}

/// Strictly above the threshold is extreme; at or below is normal.
pub fn is_extreme(deviation: f64, threshold: f64) -> bool {
    deviation.abs() > threshold
}

/// Partition rows into (extreme, normal).
pub fn split_extreme(records: &[CombinedRecord], threshold: f64) -> (Vec<CombinedRecord>, Vec<CombinedRecord>) {
    records.iter().partition(|r| is_extreme(r.deviation, threshold))
}
