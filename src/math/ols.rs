//! Ordinary least squares.
//!
//! We solve small regression problems of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! The design matrices here are tall and thin (one row per trading day, an
//! intercept column plus one regressor), so an SVD solve is cheap. Inference
//! (standard errors) needs `(XᵀX)⁻¹`, which only exists for full column rank;
//! rank-deficient inputs are reported as `None` rather than producing
//! meaningless coefficients.

use nalgebra::{DMatrix, DVector};

/// Singular values below this are treated as zero when checking column rank.
const RANK_EPS: f64 = 1e-10;

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Coefficients plus classical (homoskedastic) inference quantities.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub beta: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub residuals: DVector<f64>,
    /// Centered R² (assumes the design has an intercept column).
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Residual standard error, `sqrt(SSE / (n - k))`.
    pub sigma: f64,
    pub n: usize,
    pub df_resid: usize,
}

/// Fit OLS with standard errors.
///
/// Returns `None` when there are no residual degrees of freedom or the design
/// matrix does not have full column rank.
pub fn fit_ols(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<OlsFit> {
    let n = x.nrows();
    let k = x.ncols();
    if n != y.len() || k == 0 || n <= k {
        return None;
    }
    if x.rank(RANK_EPS) < k {
        return None;
    }

    let beta = solve_least_squares(x, y)?;
    let xtx_inv = (x.transpose() * x).try_inverse()?;

    let residuals = y - x * &beta;
    let sse = residuals.norm_squared();
    let df_resid = n - k;
    let sigma2 = sse / df_resid as f64;

    let std_errors = DVector::from_iterator(k, (0..k).map(|i| (sigma2 * xtx_inv[(i, i)]).max(0.0).sqrt()));

    let y_mean = y.mean();
    let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
    // A constant response has nothing to explain.
    let r_squared = if tss > 0.0 { 1.0 - sse / tss } else { 0.0 };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df_resid as f64;

    Some(OlsFit {
        beta,
        std_errors,
        residuals,
        r_squared,
        adj_r_squared,
        sigma: sigma2.sqrt(),
        n,
        df_resid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_ols_standard_errors_match_closed_form() {
        // x = [1,2,3,4], y = [1,3,2,5]
        // slope = 1.1, intercept = 0.0, SSE = 2.7, sigma² = 1.35, Sxx = 5
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 4.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 2.0, 5.0]);

        let fit = fit_ols(&x, &y).unwrap();
        assert!((fit.beta[0] - 0.0).abs() < 1e-10);
        assert!((fit.beta[1] - 1.1).abs() < 1e-10);
        assert_eq!(fit.df_resid, 2);
        // se(slope) = sqrt(1.35 / 5)
        assert!((fit.std_errors[1] - (1.35_f64 / 5.0).sqrt()).abs() < 1e-10);
        // se(intercept) = sqrt(1.35 * (1/4 + 2.5² / 5))
        assert!((fit.std_errors[0] - (1.35_f64 * (0.25 + 6.25 / 5.0)).sqrt()).abs() < 1e-10);
        // TSS = 8.75 -> R² = 1 - 2.7 / 8.75
        assert!((fit.r_squared - (1.0 - 2.7 / 8.75)).abs() < 1e-10);
    }

    #[test]
    fn fit_ols_rejects_constant_regressor() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 2.0, 1.0, 2.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[0.1, 0.2, 0.3]);
        assert!(fit_ols(&x, &y).is_none());
    }

    #[test]
    fn fit_ols_needs_residual_degrees_of_freedom() {
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.0, 1.0]);
        assert!(fit_ols(&x, &y).is_none());
    }
}
