//! Return volatility on extreme vs normal days.

use serde::Serialize;

use crate::analysis::threshold::is_extreme;
use crate::domain::CombinedRecord;
use crate::math::sample_std;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityVerdict {
    ExtremeHigher,
    NormalHigher,
    Equal,
    /// One side has fewer than two returns.
    Undetermined,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VolatilityComparison {
    /// Sample std of log returns on extreme days.
    pub extreme_std: Option<f64>,
    /// Sample std of log returns on normal days.
    pub normal_std: Option<f64>,
    pub n_extreme: usize,
    pub n_normal: usize,
    pub verdict: VolatilityVerdict,
}

/// Compare the return dispersion of extreme and normal rows. Rows without a
/// return (the first combined row) are ignored.
pub fn compare_volatility(records: &[CombinedRecord], threshold: f64) -> VolatilityComparison {
    let mut extreme = Vec::new();
    let mut normal = Vec::new();
    for r in records {
        let Some(ret) = r.log_return else { continue };
        if is_extreme(r.deviation, threshold) {
            extreme.push(ret);
        } else {
            normal.push(ret);
        }
    }

    let extreme_std = sample_std(&extreme);
    let normal_std = sample_std(&normal);
    let verdict = match (extreme_std, normal_std) {
        (Some(e), Some(n)) if e > n => VolatilityVerdict::ExtremeHigher,
        (Some(e), Some(n)) if e < n => VolatilityVerdict::NormalHigher,
        (Some(_), Some(_)) => VolatilityVerdict::Equal,
        _ => VolatilityVerdict::Undetermined,
    };

    VolatilityComparison {
        extreme_std,
        normal_std,
        n_extreme: extreme.len(),
        n_normal: normal.len(),
        verdict,
    }
}
