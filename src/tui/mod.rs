//! Ratatui-based terminal UI.
//!
//! The TUI runs one operation at a time on seeded synthetic sweeps and
//! renders the input, its fitted trend and the corrected (or extracted)
//! curve. Keys cycle the operation, resample the noise and change its level.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{RunOutput, run_sample};
use crate::cli::TuiArgs;
use crate::domain::{AnalysisOutput, Operation, SampleConfig};
use crate::error::AppError;

mod plotters_chart;

use plotters_chart::{ChartLine, SweepChart};

/// Noise step (dB) for ←/→.
const NOISE_STEP_DB: f64 = 0.05;
const NOISE_MAX_DB: f64 = 2.0;

const RAW_COLOR: RGBColor = RGBColor(255, 255, 255);
const FIT_COLOR: RGBColor = RGBColor(0, 255, 255);
const CORRECTED_COLOR: RGBColor = RGBColor(0, 255, 0);
const MARKER_COLOR: RGBColor = RGBColor(255, 255, 0);

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args.sample.sample_config(), args.operation);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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
    config: SampleConfig,
    operation: Operation,
    status: String,
    run: Option<RunOutput>,
}

impl App {
    fn new(config: SampleConfig, operation: Operation) -> Self {
        let mut app = Self {
            config,
            operation,
            status: String::new(),
            run: None,
        };
        app.recompute();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
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

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('o') => {
                self.operation = self.operation.next();
                self.recompute();
            }
            KeyCode::Char('r') => {
                self.config.seed = self.config.seed.wrapping_add(1);
                self.recompute();
            }
            KeyCode::Left => {
                self.config.noise_db = (self.config.noise_db - NOISE_STEP_DB).max(0.0);
                self.recompute();
            }
            KeyCode::Right => {
                self.config.noise_db = (self.config.noise_db + NOISE_STEP_DB).min(NOISE_MAX_DB);
                self.recompute();
            }
            _ => {}
        }
        false
    }

    /// Rerun the current operation; analysis failures stay on screen instead of exiting.
    fn recompute(&mut self) {
        match run_sample(self.operation, &self.config) {
            Ok(run) => {
                self.status = format!("{} ok", self.operation.display_name());
                self.run = Some(run);
            }
            Err(err) => {
                self.status = err.to_string();
                self.run = None;
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
        let lines = vec![
            Line::from(vec![
                Span::styled("sweep", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {}", self.operation.display_name())),
            ]),
            Line::from(Span::styled(
                format!(
                    "seed: {} | noise: {:.2} dB | points: {} | band: [{:.1}, {:.1}] nm",
                    self.config.seed,
                    self.config.noise_db,
                    self.config.points,
                    self.config.wavelength_start,
                    self.config.wavelength_stop,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(44)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_metrics(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Sweep").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("No result (see status line).").style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        };

        let data = chart_data(&run.output);
        let (chart_rect, insets) = chart_layout(inner);
        let widget = SweepChart {
            lines: &data.lines,
            markers: &data.markers,
            marker_color: MARKER_COLOR,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "wavelength (nm)",
            y_label: data.y_label,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &data);
        }
    }

    fn draw_metrics(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        if let Some(run) = &self.run {
            for line in crate::report::format_output(&run.output).lines() {
                lines.push(Line::from(line.to_string()));
            }
            lines.push(Line::from(""));
            for (label, color) in legend(&run.output) {
                lines.push(Line::from(Span::styled(
                    format!("── {label}"),
                    Style::default().fg(color),
                )));
            }
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Result").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "o operation  r resample  ←/→ noise  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Everything the chart widget needs for one output.
struct ChartData {
    lines: Vec<ChartLine>,
    markers: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    y_label: &'static str,
}

fn chart_data(output: &AnalysisOutput) -> ChartData {
    let (lines, markers, y_label) = match output {
        AnalysisOutput::Correction {
            trace,
            result,
            envelope,
            ..
        } => (
            vec![
                line("raw", &trace.wavelength, &trace.power, RAW_COLOR),
                line("fit", &trace.wavelength, &result.fit_curve, FIT_COLOR),
                line("corrected", &trace.wavelength, &result.corrected_power, CORRECTED_COLOR),
            ],
            envelope.iter().map(|p| (p.wavelength, p.power)).collect(),
            "power (dB)",
        ),
        AnalysisOutput::Cutback { wavelength, profile, .. } => (
            vec![
                line("raw", wavelength, &profile.loss_vs_wavelength_raw, RAW_COLOR),
                line("fit", wavelength, &profile.loss_vs_wavelength, FIT_COLOR),
            ],
            Vec::new(),
            "loss (dB/unit)",
        ),
        AnalysisOutput::Bandwidth { trace, threshold, result } => {
            let peak = trace.power.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let floor = peak - threshold;
            let half = result.bandwidth / 2.0;
            let left = result.central_wavelength - half;
            let right = result.central_wavelength + half;
            (
                vec![
                    line("power", &trace.wavelength, &trace.power, RAW_COLOR),
                    line("threshold", &[left, right], &[floor, floor], FIT_COLOR),
                ],
                vec![(left, floor), (right, floor)],
                "power (dB)",
            )
        }
    };

    let x_bounds = bounds(lines.iter().flat_map(|l| l.points.iter().map(|p| p.0)), 0.0);
    let y_bounds = bounds(
        lines
            .iter()
            .flat_map(|l| l.points.iter().map(|p| p.1))
            .chain(markers.iter().map(|p| p.1)),
        0.05,
    );

    ChartData {
        lines,
        markers,
        x_bounds,
        y_bounds,
        y_label,
    }
}

fn legend(output: &AnalysisOutput) -> Vec<(&'static str, Color)> {
    let to_color = |c: RGBColor| Color::Rgb(c.0, c.1, c.2);
    chart_data(output)
        .lines
        .iter()
        .map(|l| (l.label, to_color(l.color)))
        .collect()
}

fn line(label: &'static str, x: &[f64], y: &[f64], color: RGBColor) -> ChartLine {
    ChartLine {
        label,
        points: x
            .iter()
            .copied()
            .zip(y.iter().copied())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .collect(),
        color,
    }
}

/// Finite min/max padded by `pad_frac` of the span; `[0, 1]` when empty or flat.
fn bounds(values: impl Iterator<Item = f64>, pad_frac: f64) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 0.5, hi + 0.5];
    }
    let pad = (hi - lo) * pad_frac;
    [lo - pad, hi + pad]
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(frame: &mut ratatui::Frame<'_>, inner: Rect, chart: Rect, insets: AxisInsets, data: &ChartData) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);
    let [x0, x1] = data.x_bounds;
    let [y0, y1] = data.y_bounds;

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x0 + u * (x1 - x0);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub(label_len / 2);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y0 + u * (y1 - y0);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.1}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("wavelength (nm)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new(data.y_label).style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
