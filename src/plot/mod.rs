//! Terminal (ASCII) and file (SVG) renderings of the combined dataset.

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_plot;
pub use chart::{ChartLabels, write_chart_svg};
