//! Dual-axis SVG chart: price on the left axis, weather deviation as a dashed
//! line on the right axis.

use std::error::Error;
use std::path::Path;

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::domain::{AnalysisConfig, CombinedRecord};
use crate::error::AppError;

pub const PRICE_COLOR: RGBColor = RGBColor(31, 119, 180);
pub const DEVIATION_COLOR: RGBColor = RGBColor(214, 39, 40);

const CHART_SIZE: (u32, u32) = (1200, 600);

/// Text shown on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartLabels {
    pub title: String,
    pub price_axis: String,
    pub deviation_axis: String,
    pub price_series: String,
    pub deviation_series: String,
}

impl ChartLabels {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let metric = config.metric.display_name();
        let field = config.price_field.display_name();
        Self {
            title: format!(
                "{} {} vs {} {} Deviation",
                config.symbol, field, config.location_name, metric
            ),
            price_axis: format!("{field} Price"),
            deviation_axis: format!("{metric} Deviation ({})", config.metric.unit()),
            price_series: format!("{} {field}", config.symbol),
            deviation_series: format!("{metric} Deviation"),
        }
    }
}

/// Day offsets from the first record, so the x axis stays numeric.
pub fn day_offsets(records: &[CombinedRecord]) -> Vec<f64> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    records
        .iter()
        .map(|r| (r.date - first.date).num_days() as f64)
        .collect()
}

/// Axis range with a small margin; degenerate ranges are widened.
pub fn axis_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    let span = max - min;
    let pad = if span > 0.0 { span * 0.05 } else { min.abs().max(1.0) * 0.05 };
    Some((min - pad, max + pad))
}

fn date_label(origin: NaiveDate, offset: f64) -> String {
    (origin + Duration::days(offset.round() as i64)).format("%Y-%m-%d").to_string()
}

/// Render the chart to an SVG file.
pub fn write_chart_svg(path: &Path, records: &[CombinedRecord], labels: &ChartLabels) -> Result<(), AppError> {
    if records.is_empty() {
        return Err(AppError::io("Nothing to chart: combined dataset is empty."));
    }
    draw_svg(path, records, labels)
        .map_err(|e| AppError::io(format!("Failed to render chart {}: {e}", path.display())))
}

fn draw_svg(path: &Path, records: &[CombinedRecord], labels: &ChartLabels) -> Result<(), Box<dyn Error>> {
    let origin = records[0].date;
    let xs = day_offsets(records);
    let x_end = xs.last().copied().unwrap_or(0.0).max(1.0);
    let (p_min, p_max) = axis_range(records.iter().map(|r| r.close)).ok_or("no finite prices")?;
    let (d_min, d_max) = axis_range(records.iter().map(|r| r.deviation)).ok_or("no finite deviations")?;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&labels.title, ("sans-serif", 22))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .right_y_label_area_size(70)
        .build_cartesian_2d(0.0..x_end, p_min..p_max)?
        .set_secondary_coord(0.0..x_end, d_min..d_max);

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc(&labels.price_axis)
        .x_labels(8)
        .x_label_formatter(&|v| date_label(origin, *v))
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc(&labels.deviation_axis)
        .y_label_formatter(&|v| format!("{v:.1}"))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            xs.iter().zip(records).map(|(x, r)| (*x, r.close)),
            PRICE_COLOR.stroke_width(2),
        ))?
        .label(&labels.price_series)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PRICE_COLOR.stroke_width(2)));

    let deviation_points: Vec<(f64, f64)> = xs.iter().zip(records).map(|(x, r)| (*x, r.deviation)).collect();
    chart
        .draw_secondary_series(DashedLineSeries::new(
            deviation_points,
            6,
            4,
            DEVIATION_COLOR.stroke_width(1),
        ))?
        .label(&labels.deviation_series)
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DEVIATION_COLOR.stroke_width(1)));

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}
