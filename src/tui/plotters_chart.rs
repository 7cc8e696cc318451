//! Plotters-powered dual-axis chart widget for Ratatui.
//!
//! Price is drawn against the left axis; the weather deviation is a dashed line
//! against the right axis. Rendering goes through `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description. All series and bounds are computed outside
/// the render call.
pub struct DualAxisChart<'a> {
    /// Price line, x in days since `origin`.
    pub price: &'a [(f64, f64)],
    /// Deviation line on the secondary axis.
    pub deviation: &'a [(f64, f64)],
    /// Extreme-day markers (a subset of `deviation`); empty when hidden.
    pub extremes: &'a [(f64, f64)],
    pub x_bounds: [f64; 2],
    pub price_bounds: [f64; 2],
    pub deviation_bounds: [f64; 2],
    pub origin: NaiveDate,
    pub price_label: &'a str,
    pub deviation_label: &'a str,
}

fn valid(b: [f64; 2]) -> bool {
    b[0].is_finite() && b[1].is_finite() && b[1] > b[0]
}

impl<'a> Widget for DualAxisChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 30 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }
        if !(valid(self.x_bounds) && valid(self.price_bounds) && valid(self.deviation_bounds)) {
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [p0, p1] = self.price_bounds;
        let [d0, d1] = self.deviation_bounds;
        let origin = self.origin;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Right, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, p0..p1)?
                .set_secondary_coord(x0..x1, d0..d1);

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .y_desc(self.price_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (origin + Duration::days(v.round() as i64)).format("%b %d").to_string())
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart
                .configure_secondary_axes()
                .y_desc(self.deviation_label)
                .y_labels(5)
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .draw()?;

            let price_color = RGBColor(0, 255, 255); // cyan
            let deviation_color = RGBColor(255, 80, 80); // red
            let extreme_color = RGBColor(255, 255, 0); // yellow

            chart.draw_series(LineSeries::new(self.price.iter().copied(), &price_color))?;
            chart.draw_secondary_series(DashedLineSeries::new(
                self.deviation.to_vec(),
                2,
                2,
                deviation_color.into(),
            ))?;

            // `Circle` radii are mapped incorrectly by the ratatui backend; a
            // colored `Pixel` is used as the marker instead.
            chart.draw_secondary_series(
                self.extremes
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), extreme_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
