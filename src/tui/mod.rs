//! Ratatui-based terminal UI for `wxr view`.
//!
//! Shows the price and weather-deviation chart with optional extreme-day
//! markers and a statistics panel.
//!
//! Keys: `q`/`Esc` quit, `e` toggle extreme markers, `s` toggle the stats
//! panel, `m` cycle the weather metric, `r` re-run the pipeline.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};
use tracing::warn;

use crate::analysis::is_extreme;
use crate::app::pipeline::{self, RunOutput};
use crate::domain::{AnalysisConfig, Metric, SourceKind};
use crate::error::AppError;
use crate::report::{format_regression, format_volatility};

mod plotters_chart;

use plotters_chart::DualAxisChart;

/// Run the pipeline, then start the TUI.
///
/// The first run happens before the terminal is switched to raw mode so that a
/// failure is reported like any other command error.
pub fn run(config: AnalysisConfig) -> Result<(), AppError> {
    let output = pipeline::run(&config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::io(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config, output);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::io(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::io(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: AnalysisConfig,
    run: RunOutput,
    show_extremes: bool,
    show_stats: bool,
    status: String,
}

impl App {
    fn new(config: AnalysisConfig, run: RunOutput) -> Self {
        Self {
            config,
            run,
            show_extremes: true,
            show_stats: true,
            status: "Ready.".to_string(),
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::io(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100)).map_err(|e| AppError::io(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::io(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('e') => {
                self.show_extremes = !self.show_extremes;
                self.status = format!("extreme markers: {}", on_off(self.show_extremes));
            }
            KeyCode::Char('s') => {
                self.show_stats = !self.show_stats;
                self.status = format!("stats panel: {}", on_off(self.show_stats));
            }
            KeyCode::Char('m') => {
                let previous = self.config.metric;
                self.config.metric = next_metric(previous);
                if !self.rerun() {
                    self.config.metric = previous;
                }
            }
            KeyCode::Char('r') => {
                if self.config.source == SourceKind::Synthetic {
                    self.config.seed = self.config.seed.wrapping_add(1);
                }
                self.rerun();
            }
            _ => {}
        }
        false
    }

    /// Re-run the pipeline with the current config. Failures stay on screen.
    fn rerun(&mut self) -> bool {
        match pipeline::run(&self.config) {
            Ok(run) => {
                self.run = run;
                self.status = format!(
                    "metric: {} | seed: {} | rows: {}",
                    self.config.metric.display_name(),
                    self.config.seed,
                    self.run.combined.len()
                );
                true
            }
            Err(err) => {
                warn!(%err, "re-run failed");
                self.status = format!("Run failed: {err}");
                false
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let analysis = &self.run.analysis;
        let lines = vec![
            Line::from(vec![
                Span::styled("wxr", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " | {} vs {} {} deviation",
                    self.config.symbol,
                    self.config.location_name,
                    self.config.metric.display_name()
                )),
            ]),
            Line::from(Span::styled(
                format!(
                    "{}..{} | n={} | threshold |dev| > {:.2} {} | extreme days: {} | slope p={:.4}",
                    self.config.start,
                    self.config.end,
                    analysis.n_rows,
                    analysis.threshold_value,
                    self.config.metric.unit(),
                    analysis.extreme_dates.len(),
                    analysis.regression.slope.p_value
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        if !self.show_stats {
            self.draw_chart(frame, area);
            return;
        }
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(62)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_stats(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!(
            "{} {} (cyan, left) | {} deviation (red dashed, right){}",
            self.config.symbol,
            self.config.price_field.display_name(),
            self.config.metric.display_name(),
            if self.show_extremes { " | extreme (yellow)" } else { "" }
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(series) = chart_series(&self.run, self.show_extremes) else {
            let msg = Paragraph::new("No data to chart.").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let price_label = format!("{} Price", self.config.price_field.display_name());
        let deviation_label = format!("Deviation ({})", self.config.metric.unit());
        let widget = DualAxisChart {
            price: &series.price,
            deviation: &series.deviation,
            extremes: &series.extremes,
            x_bounds: series.x_bounds,
            price_bounds: series.price_bounds,
            deviation_bounds: series.deviation_bounds,
            origin: series.origin,
            price_label: &price_label,
            deviation_label: &deviation_label,
        };
        frame.render_widget(widget, inner);
    }

    fn draw_stats(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let analysis = &self.run.analysis;
        let mut text = format_regression(&analysis.regression, analysis.regression_sample);
        text.push('\n');
        text.push_str(&format_volatility(&analysis.volatility));

        let p = Paragraph::new(text)
            .style(Style::default().fg(Color::White))
            .block(
                Block::default()
                    .title(Span::styled("Statistics", Style::default().add_modifier(Modifier::BOLD)))
                    .borders(Borders::ALL),
            );
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "e extremes  s stats  m metric  r re-run  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Series and bounds for the chart widget.
#[derive(Debug, Clone, PartialEq)]
struct ChartSeries {
    price: Vec<(f64, f64)>,
    deviation: Vec<(f64, f64)>,
    extremes: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    price_bounds: [f64; 2],
    deviation_bounds: [f64; 2],
    origin: chrono::NaiveDate,
}

fn chart_series(run: &RunOutput, show_extremes: bool) -> Option<ChartSeries> {
    let records = &run.combined;
    let origin = records.first()?.date;
    let xs = crate::plot::chart::day_offsets(records);

    let price: Vec<(f64, f64)> = xs.iter().zip(records).map(|(x, r)| (*x, r.close)).collect();
    let deviation: Vec<(f64, f64)> = xs.iter().zip(records).map(|(x, r)| (*x, r.deviation)).collect();
    let extremes = if show_extremes {
        deviation
            .iter()
            .copied()
            .filter(|(_, d)| is_extreme(*d, run.analysis.threshold_value))
            .collect()
    } else {
        Vec::new()
    };

    let x_end = xs.last().copied().unwrap_or(0.0).max(1.0);
    let (p0, p1) = crate::plot::chart::axis_range(records.iter().map(|r| r.close))?;
    let (d0, d1) = crate::plot::chart::axis_range(records.iter().map(|r| r.deviation))?;

    Some(ChartSeries {
        price,
        deviation,
        extremes,
        x_bounds: [0.0, x_end],
        price_bounds: [p0, p1],
        deviation_bounds: [d0, d1],
        origin,
    })
}

fn next_metric(metric: Metric) -> Metric {
    match metric {
        Metric::Tavg => Metric::Tmin,
        Metric::Tmin => Metric::Tmax,
        Metric::Tmax => Metric::Prcp,
        Metric::Prcp => Metric::Tavg,
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}
