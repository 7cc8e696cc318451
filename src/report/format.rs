//! Formatted terminal output: run summary, regression table, volatility
//! comparison and the climatology table.
//!
//! Formatting lives here so the pipeline and statistics code stay free of
//! presentation concerns.

use crate::analysis::{AnalysisSummary, Coefficient, RegressionSummary, VolatilityComparison, VolatilityVerdict};
use crate::app::pipeline::RunOutput;
use crate::domain::{AnalysisConfig, ExtremeThreshold, RegressionSample};
use crate::signal::Climatology;

/// Full report for `wxr analyze`.
pub fn format_report(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = format_run_summary(run, config);
    out.push('\n');
    out.push_str(&format_regression(&run.analysis.regression, run.analysis.regression_sample));
    out.push('\n');
    out.push_str(&format_volatility(&run.analysis.volatility));
    out
}

/// Dataset overview: instrument, location, windows and row counts.
pub fn format_run_summary(run: &RunOutput, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    let metric = config.metric;
    let (ref_from, ref_to) = run.climatology.window();

    out.push_str(&format!(
        "=== wxr - {} vs {} {} deviation ===\n",
        config.symbol,
        config.location_name,
        metric.display_name()
    ));
    out.push_str(&format!(
        "Period: {}..{} | reference: {}..{} ({} calendar days)\n",
        config.start,
        config.end,
        ref_from,
        ref_to,
        run.climatology.len()
    ));
    out.push_str(&format!(
        "Location: {} ({:.4}, {:.4}, {:.0}m) | metric: {:?} ({})\n",
        config.location_name,
        config.location.latitude,
        config.location.longitude,
        config.location.elevation_m,
        metric,
        metric.unit()
    ));

    let null_days = run.weather.iter().filter(|w| w.value.is_none()).count();
    out.push_str(&format!(
        "Prices: n={} ({}, {}) | weather days: {} ({} null)\n",
        run.prices.len(),
        config.price_field.display_name(),
        config.interval.as_str(),
        run.weather.len(),
        null_days
    ));
    out.push_str(&format!(
        "Combined: n={} | dropped (no weather): {}\n",
        run.combined.len(),
        run.dropped.len()
    ));
    out.push_str(&format_threshold(&run.analysis, metric.unit()));
    out
}

fn format_threshold(analysis: &AnalysisSummary, unit: &str) -> String {
    let source = match analysis.threshold {
        ExtremeThreshold::Quantile(_) => format!("{} (full period)", analysis.threshold.describe()),
        ExtremeThreshold::Fixed(_) => "fixed".to_string(),
    };
    format!(
        "Extreme threshold: |deviation| > {:.3} {unit} [{source}] | extreme days: {}\n",
        analysis.threshold_value,
        analysis.extreme_dates.len()
    )
}

/// OLS table for `log_return = intercept + slope * deviation`.
pub fn format_regression(reg: &RegressionSummary, sample: RegressionSample) -> String {
    let mut out = String::new();
    let sample_label = match sample {
        RegressionSample::Extreme => "extreme days",
        RegressionSample::All => "all days",
    };

    out.push_str(&format!("Regression ({sample_label}): log_return = a + b * deviation\n"));
    out.push_str(&format!(
        "  {:<10} {:>12} {:>12} {:>9} {:>9}\n",
        "", "estimate", "std err", "t", "p"
    ));
    out.push_str(&coefficient_row("intercept", &reg.intercept));
    out.push_str(&coefficient_row("deviation", &reg.slope));
    out.push_str(&format!(
        "  R²={:.4} | adj R²={:.4} | resid se={:.6} | n={} | df={}\n",
        reg.r_squared, reg.adj_r_squared, reg.residual_std_error, reg.n_obs, reg.df_resid
    ));

    let verdict = if reg.significant { "is" } else { "is not" };
    out.push_str(&format!(
        "  Slope {verdict} significant at alpha={} (p={:.4}).\n",
        reg.alpha, reg.slope.p_value
    ));
    out
}

fn coefficient_row(name: &str, c: &Coefficient) -> String {
    format!(
        "  {:<10} {:>12.6} {:>12.6} {:>9.3} {:>9.4}\n",
        name, c.estimate, c.std_error, c.t_stat, c.p_value
    )
}

/// Extreme vs normal return volatility.
pub fn format_volatility(vol: &VolatilityComparison) -> String {
    let mut out = String::new();
    out.push_str("Volatility of log returns (sample std):\n");
    out.push_str(&format!("  extreme days: {} (n={})\n", fmt_std(vol.extreme_std), vol.n_extreme));
    out.push_str(&format!("  normal days:  {} (n={})\n", fmt_std(vol.normal_std), vol.n_normal));

    let verdict = match vol.verdict {
        VolatilityVerdict::ExtremeHigher => "Returns are more volatile on extreme weather days.",
        VolatilityVerdict::NormalHigher => "Returns are less volatile on extreme weather days.",
        VolatilityVerdict::Equal => "Return volatility is the same on extreme and normal days.",
        VolatilityVerdict::Undetermined => "Not enough returns on one side to compare volatility.",
    };
    out.push_str(&format!("  -> {verdict}\n"));
    out
}

fn fmt_std(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.6}"),
        None => "n/a".to_string(),
    }
}

/// Calendar-day climatology table for `wxr climatology`.
pub fn format_climatology(clim: &Climatology, config: &AnalysisConfig) -> String {
    let mut out = String::new();
    let (from, to) = clim.window();
    out.push_str(&format!(
        "=== Climatology: {} {} ({}) | {}..{} ===\n",
        config.location_name,
        config.metric.display_name(),
        config.metric.unit(),
        from,
        to
    ));
    out.push_str(&format!("{:<6} {:>4} {:>9}\n", "day", "n", "mean"));
    for (day, stat) in clim.sorted() {
        let mean = stat.mean.map(|m| format!("{m:.2}")).unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("{:<6} {:>4} {:>9}\n", day.to_string(), stat.count, mean));
    }
    out
}
