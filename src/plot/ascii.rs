//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Both series share the x axis (trading-day index) but have independent
//! y scales, like the left/right axes of the SVG chart.
//!
//! Plot elements:
//! - price: `-` line (left scale)
//! - weather deviation: `.` line (right scale)
//! - optional highlights: `*` on extreme-deviation days

use crate::analysis::is_extreme;
use crate::domain::CombinedRecord;

/// Render price and deviation for the combined dataset.
pub fn render_ascii_plot(records: &[CombinedRecord], threshold: Option<f64>, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (records.first(), records.last()) else {
        return "Plot: no data\n".to_string();
    };

    let x_max = (records.len() - 1).max(1) as f64;
    let (p_min, p_max) = pad_range_of(records.iter().map(|r| r.close));
    let (d_min, d_max) = pad_range_of(records.iter().map(|r| r.deviation));

    let mut grid = vec![vec![' '; width]; height];

    let price: Vec<(usize, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (map_x(i as f64, 0.0, x_max, width), map_y(r.close, p_min, p_max, height)))
        .collect();
    let deviation: Vec<(usize, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (map_x(i as f64, 0.0, x_max, width), map_y(r.deviation, d_min, d_max, height)))
        .collect();

    // Price first; the deviation line only fills empty cells.
    draw_polyline(&mut grid, &price, '-');
    draw_polyline(&mut grid, &deviation, '.');

    if let Some(thr) = threshold {
        for (r, &(x, y)) in records.iter().zip(&deviation) {
            if is_extreme(r.deviation, thr) {
                grid[y][x] = '*';
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: {}..{} | price=[{p_min:.2}, {p_max:.2}] (-) | deviation=[{d_min:.2}, {d_max:.2}] (.)",
        first.date, last.date
    ));
    if let Some(thr) = threshold {
        out.push_str(&format!(" | * |deviation| > {thr:.2}"));
    }
    out.push('\n');

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn pad_range_of(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return (0.0, 1.0);
    }
    pad_range(min, max, 0.05)
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(usize, usize)], ch: char) {
    let mut prev: Option<(usize, usize)> = None;
    for &(x, y) in points {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => {
                if grid[y][x] == ' ' {
                    grid[y][x] = ch;
                }
            }
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish). Only writes into empty cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
