//! ASCII/Unicode plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements are series drawn in order. Line series only fill blank
//! cells (the first line drawn wins); point series overwrite whatever is
//! underneath.

use crate::domain::AnalysisOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Line,
    Points,
}

#[derive(Debug, Clone)]
pub struct Series {
    pub label: String,
    pub glyph: char,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn line(label: &str, glyph: char, x: &[f64], y: &[f64]) -> Self {
        Self::new(label, glyph, SeriesKind::Line, x, y)
    }

    pub fn points(label: &str, glyph: char, x: &[f64], y: &[f64]) -> Self {
        Self::new(label, glyph, SeriesKind::Points, x, y)
    }

    fn new(label: &str, glyph: char, kind: SeriesKind, x: &[f64], y: &[f64]) -> Self {
        Self {
            label: label.to_string(),
            glyph,
            kind,
            points: x.iter().copied().zip(y.iter().copied()).collect(),
        }
    }
}

/// Render one or more series on a shared grid.
pub fn render_ascii_plot(series: &[Series], width: usize, height: usize, y_unit: &str) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (x_min, x_max) = range(series.iter().flat_map(|s| s.points.iter().map(|p| p.0))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = range(series.iter().flat_map(|s| s.points.iter().map(|p| p.1))).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first (so points can overlay).
    for s in series.iter().filter(|s| s.kind == SeriesKind::Line) {
        draw_curve(&mut grid, &s.points, s.glyph, x_min, x_max, y_min, y_max);
    }
    for s in series.iter().filter(|s| s.kind == SeriesKind::Points) {
        for &(x, y) in &s.points {
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            let col = map_x(x, x_min, x_max, width);
            let row = map_y(y, y_min, y_max, height);
            grid[row][col] = s.glyph;
        }
    }

    // Build final string. We include a small header with ranges.
    let mut out = String::new();
    out.push_str(&format!(
        "Plot: wavelength=[{x_min:.3}, {x_max:.3}] | y=[{y_min:.2}, {y_max:.2}]{y_unit}\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    let legend: Vec<String> = series.iter().map(|s| format!("{} {}", s.glyph, s.label)).collect();
    out.push_str(&format!("Legend: {}\n", legend.join("  ")));

    out
}

/// Standard plots for a result: the input with its trend, then the derived curve.
pub fn render_output_plot(output: &AnalysisOutput, width: usize, height: usize) -> String {
    match output {
        AnalysisOutput::Correction {
            trace,
            result,
            envelope,
            ..
        } => {
            let mut top = vec![
                Series::line("fit", '-', &trace.wavelength, &result.fit_curve),
                Series::line("raw", '.', &trace.wavelength, &trace.power),
            ];
            if !envelope.is_empty() {
                let ew: Vec<f64> = envelope.iter().map(|p| p.wavelength).collect();
                let ep: Vec<f64> = envelope.iter().map(|p| p.power).collect();
                top.push(Series::points("envelope", 'o', &ew, &ep));
            }
            let bottom = [Series::line("corrected", '*', &trace.wavelength, &result.corrected_power)];

            let mut out = render_ascii_plot(&top, width, height, "dB");
            out.push_str(&render_ascii_plot(&bottom, width, height, "dB"));
            out
        }
        AnalysisOutput::Cutback { wavelength, profile, .. } => {
            let series = [
                Series::line("fit", '-', wavelength, &profile.loss_vs_wavelength),
                Series::line("raw", '.', wavelength, &profile.loss_vs_wavelength_raw),
            ];
            render_ascii_plot(&series, width, height, "dB/unit")
        }
        AnalysisOutput::Bandwidth { trace, result, .. } => {
            let left = result.central_wavelength - result.bandwidth / 2.0;
            let right = result.central_wavelength + result.bandwidth / 2.0;
            let edges_x = [left, right];
            let edges_y: Vec<f64> = edges_x
                .iter()
                .map(|&x| nearest_power(&trace.wavelength, &trace.power, x))
                .collect();
            let series = [
                Series::line("power", '.', &trace.wavelength, &trace.power),
                Series::points("band edge", '|', &edges_x, &edges_y),
            ];
            render_ascii_plot(&series, width, height, "dB")
        }
    }
}

fn nearest_power(wavelength: &[f64], power: &[f64], x: f64) -> f64 {
    crate::extract::find_nearest(wavelength, x)
        .map(|i| power[i])
        .unwrap_or(f64::NAN)
}

fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if min.is_finite() && max.is_finite() && max > min {
        Some((min, max))
    } else if min.is_finite() {
        Some((min - 0.5, max + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(
    grid: &mut [Vec<char>],
    curve: &[(f64, f64)],
    glyph: char,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in curve {
        if !(x.is_finite() && y.is_finite()) {
            prev = None;
            continue;
        }
        let col = map_x(x, x_min, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        if let Some((c0, r0)) = prev {
            draw_line(grid, c0, r0, col, row, glyph);
        } else if grid[row][col] == ' ' {
            grid[row][col] = glyph;
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish).
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
