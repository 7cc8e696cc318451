//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - resolves the preset + overrides into an `AnalysisConfig`
//! - runs the pipeline
//! - prints reports/plots and writes optional exports

use clap::Parser;
use tracing::info;

use crate::cli::{AnalyzeArgs, Command};
use crate::domain::{AnalysisConfig, ExtremeThreshold, GeoPoint};
use crate::error::{AppError, Stage, StageExt};
use crate::logging::LogOutput;

pub mod pipeline;

/// Entry point for the `wxr` binary.
pub fn run() -> Result<(), AppError> {
    // `wxr` and `wxr --preset rainfall` behave like `wxr analyze ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    crate::logging::init(
        crate::logging::level_for(cli.verbose, cli.quiet),
        log_output_for(&cli.command),
    );

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Climatology(args) => handle_climatology(args),
        Command::View(args) => handle_view(args),
    }
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args);
    let run = pipeline::run(&config)?;

    println!("{}", crate::report::format_report(&run, &config));

    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.combined,
            Some(run.analysis.threshold_value),
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.chart {
        let labels = crate::plot::ChartLabels::from_config(&config);
        crate::plot::write_chart_svg(path, &run.combined, &labels).at_stage(Stage::Presentation)?;
        info!(path = %path.display(), "wrote chart");
    }
    if let Some(path) = &config.export {
        crate::io::export::write_combined_csv(path, &run.combined, run.analysis.threshold_value)
            .at_stage(Stage::Presentation)?;
        info!(path = %path.display(), rows = run.combined.len(), "wrote combined dataset");
    }
    if let Some(path) = &config.export_summary {
        crate::io::export::write_summary_json(path, &run, &config).at_stage(Stage::Presentation)?;
        info!(path = %path.display(), "wrote summary");
    }

    Ok(())
}

fn handle_climatology(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args);
    config.validate().at_stage(Stage::Setup)?;
    let sources = pipeline::Sources::from_config(&config)?;
    let climatology = pipeline::build_climatology(&config, sources.weather.as_ref())?;
    println!("{}", crate::report::format_climatology(&climatology, &config));
    Ok(())
}

fn handle_view(args: AnalyzeArgs) -> Result<(), AppError> {
    crate::tui::run(config_from_args(&args))
}

fn log_output_for(command: &Command) -> LogOutput {
    match command {
        Command::View(_) => LogOutput::Discard,
        Command::Analyze(_) | Command::Climatology(_) => LogOutput::Stderr,
    }
}

/// Resolve the preset and explicit overrides into a run configuration.
pub fn config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    let threshold = match (args.threshold_quantile, args.threshold_fixed) {
        (Some(q), _) => ExtremeThreshold::Quantile(q),
        (None, Some(x)) => ExtremeThreshold::Fixed(x),
        (None, None) => args.preset.threshold(),
    };

    AnalysisConfig {
        symbol: args.symbol.clone(),
        price_field: args.field,
        interval: args.interval,
        start: args.start,
        end: args.end,
        location: GeoPoint {
            latitude: args.lat,
            longitude: args.lon,
            elevation_m: args.elevation,
        },
        location_name: args.location_name.clone(),
        reference_years: args.reference_years,
        metric: args.metric.unwrap_or(args.preset.metric()),
        threshold,
        regression_sample: args.regress_on,
        alpha: args.alpha,
        source: args.source,
        seed: args.seed,

        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        chart: args.chart.clone(),
        export: args.export.clone(),
        export_summary: args.export_summary.clone(),
    }
}

/// Rewrite argv so `wxr` defaults to `wxr analyze`.
///
/// Rules:
/// - `wxr`                      -> `wxr analyze`
/// - `wxr --preset rainfall`    -> `wxr analyze --preset rainfall`
/// - `wxr --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("analyze".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "analyze" | "climatology" | "view") {
        return argv;
    }
    if arg1.starts_with('-') {
        argv.insert(1, "analyze".to_string());
    }
    argv
}
