//! Regression of log return on weather deviation.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::error::AppError;
use crate::math::{fit_ols, sample_std, student_t_two_sided_p};

/// Smallest sample that leaves a residual degree of freedom for `y = a + b x`.
pub const MIN_OBSERVATIONS: usize = 3;

/// One estimated coefficient with its test statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coefficient {
    pub estimate: f64,
    pub std_error: f64,
    pub t_stat: f64,
    pub p_value: f64,
}

/// Structured OLS summary for `return = intercept + slope * deviation`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSummary {
    pub slope: Coefficient,
    pub intercept: Coefficient,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub residual_std_error: f64,
    pub n_obs: usize,
    pub df_resid: usize,
    pub alpha: f64,
    /// Slope p-value below `alpha`.
    pub significant: bool,
}

/// Fit the regression on `(deviation, log_return)` pairs.
pub fn regress_returns(pairs: &[(f64, f64)], alpha: f64) -> Result<RegressionSummary, AppError> {
    let n = pairs.len();
    if n < MIN_OBSERVATIONS {
        return Err(AppError::numeric(format!(
            "Regression needs at least {MIN_OBSERVATIONS} observations, got {n}."
        )));
    }

    let deviations: Vec<f64> = pairs.iter().map(|(x, _)| *x).collect();
    if sample_std(&deviations).is_none_or(|s| s <= 0.0) {
        return Err(AppError::numeric("Deviation column has zero variance; slope is not identified."));
    }

    let x = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { pairs[i].0 });
    let y = DVector::from_iterator(n, pairs.iter().map(|(_, r)| *r));

    let fit = fit_ols(&x, &y).ok_or_else(|| AppError::numeric("Design matrix is rank deficient."))?;

    let df = fit.df_resid as f64;
    let coefficient = |i: usize| {
        let estimate = fit.beta[i];
        let std_error = fit.std_errors[i];
        let t_stat = if std_error > 0.0 { estimate / std_error } else { f64::INFINITY.copysign(estimate) };
        let p_value = if t_stat.is_finite() { student_t_two_sided_p(t_stat, df)? } else { 0.0 };
        Ok::<_, AppError>(Coefficient {
            estimate,
            std_error,
            t_stat,
            p_value,
        })
    };

    let intercept = coefficient(0)?;
    let slope = coefficient(1)?;

    Ok(RegressionSummary {
        slope,
        intercept,
        r_squared: fit.r_squared,
        adj_r_squared: fit.adj_r_squared,
        residual_std_error: fit.sigma,
        n_obs: fit.n,
        df_resid: fit.df_resid,
        alpha,
        significant: slope.p_value < alpha,
    })
}
