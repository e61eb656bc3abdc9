//! Sweep ingest and normalization.
//!
//! Turns a measurement export into a clean `Trace` that is safe to fit.
//!
//! CSV layout:
//! - one header row
//! - a `wavelength` column (case-insensitive, BOM tolerant)
//! - every other column is a detector channel; `port` picks the n-th one,
//!   with a column literally named `power` always counted as channel 0
//!
//! Design goals:
//! - **Strict schema** for the wavelength axis (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (no resampling, no sorting)

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::domain::Trace;
use crate::error::AppError;
use crate::io::source::load_dataset_trace;

/// Summary stats about the samples actually kept.
#[derive(Debug, Clone)]
pub struct TraceStats {
    pub n_points: usize,
    pub wavelength_min: f64,
    pub wavelength_max: f64,
    pub power_min: f64,
    pub power_max: f64,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: trace + provenance + stats + row errors.
#[derive(Debug, Clone)]
pub struct IngestedTrace {
    pub trace: Trace,
    pub source: PathBuf,
    /// Name of the channel (column or dataset convention) the power came from.
    pub channel: String,
    pub stats: TraceStats,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl IngestedTrace {
    /// Wrap an already-decoded trace (no row-level ingest happened).
    pub fn from_trace(trace: Trace, source: PathBuf, channel: String) -> Result<Self, AppError> {
        let stats = compute_stats(&trace)
            .ok_or_else(|| AppError::new(3, format!("No valid samples in '{}'.", source.display())))?;
        ensure_ascending(&trace, &source)?;
        let n = trace.len();
        Ok(Self {
            trace,
            source,
            channel,
            stats,
            row_errors: Vec::new(),
            rows_read: n,
            rows_used: n,
        })
    }
}

/// Load a trace from `path`; `.json` files are measurement datasets, anything
/// else is read as CSV.
pub fn load_trace(path: &Path, port: usize) -> Result<IngestedTrace, AppError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    let ingested = if is_json {
        load_dataset_trace(path, port)?
    } else {
        load_trace_csv(path, port)?
    };

    log::info!(
        "loaded {} samples from '{}' (channel {}, {} rows skipped)",
        ingested.rows_used,
        path.display(),
        ingested.channel,
        ingested.row_errors.len()
    );
    for e in &ingested.row_errors {
        log::warn!("{}:{}: {}", path.display(), e.line, e.message);
    }

    Ok(ingested)
}

/// Load one channel of a sweep CSV.
pub fn load_trace_csv(path: &Path, port: usize) -> Result<IngestedTrace, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let header_map = build_header_map(&headers);
    let wavelength_idx = *header_map
        .get("wavelength")
        .ok_or_else(|| AppError::new(2, "Missing required column: `wavelength`"))?;

    let channels = channel_columns(&headers, wavelength_idx);
    let (power_idx, channel) = channels.get(port).cloned().ok_or_else(|| {
        AppError::new(
            2,
            format!(
                "Port {port} is out of range: '{}' has {} power channel(s).",
                path.display(),
                channels.len()
            ),
        )
    })?;

    let mut wavelength = Vec::new();
    let mut power = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, wavelength_idx, power_idx, &channel) {
            Ok((w, p)) => {
                wavelength.push(w);
                power.push(p);
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    let rows_used = power.len();
    if rows_used == 0 {
        return Err(AppError::new(
            3,
            format!("No valid rows in '{}'.", path.display()),
        ));
    }

    let trace = Trace::new(wavelength, power)?;
    ensure_ascending(&trace, path)?;

    let stats = compute_stats(&trace)
        .ok_or_else(|| AppError::new(3, "No valid samples remain after ingest."))?;

    Ok(IngestedTrace {
        trace,
        source: path.to_path_buf(),
        channel,
        stats,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Parse a comma-separated list of unit counts (`"1, 2, 4"`).
pub fn parse_counts(s: &str) -> Result<Vec<u32>, AppError> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<u32>()
                .map_err(|e| AppError::new(2, format!("Invalid unit count '{t}': {e}")))
        })
        .collect()
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report a missing `wavelength` column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Channel columns in port order: `power` first (if present), then the rest
/// in file order.
fn channel_columns(headers: &StringRecord, wavelength_idx: usize) -> Vec<(usize, String)> {
    let mut channels: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != wavelength_idx)
        .map(|(idx, name)| (idx, normalize_header_name(name)))
        .collect();

    if let Some(pos) = channels.iter().position(|(_, name)| name == "power") {
        let power = channels.remove(pos);
        channels.insert(0, power);
    }
    channels
}

fn parse_row(
    record: &StringRecord,
    wavelength_idx: usize,
    power_idx: usize,
    channel: &str,
) -> Result<(f64, f64), String> {
    let w = parse_f64(record.get(wavelength_idx))
        .ok_or_else(|| "Missing/invalid `wavelength` value.".to_string())?;
    let p = parse_f64(record.get(power_idx))
        .ok_or_else(|| format!("Missing/invalid `{channel}` value."))?;
    Ok((w, p))
}

fn parse_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn ensure_ascending(trace: &Trace, path: &Path) -> Result<(), AppError> {
    if !trace.is_ascending() {
        return Err(AppError::new(
            2,
            format!("Wavelength axis in '{}' is not strictly increasing.", path.display()),
        ));
    }
    Ok(())
}

pub fn compute_stats(trace: &Trace) -> Option<TraceStats> {
    let mut wavelength_min = f64::INFINITY;
    let mut wavelength_max = f64::NEG_INFINITY;
    let mut power_min = f64::INFINITY;
    let mut power_max = f64::NEG_INFINITY;

    for (&w, &p) in trace.wavelength.iter().zip(&trace.power) {
        wavelength_min = wavelength_min.min(w);
        wavelength_max = wavelength_max.max(w);
        power_min = power_min.min(p);
        power_max = power_max.max(p);
    }

    if !wavelength_min.is_finite() || !wavelength_max.is_finite() || !power_min.is_finite() || !power_max.is_finite() {
        return None;
    }

    Some(TraceStats {
        n_points: trace.len(),
        wavelength_min,
        wavelength_max,
        power_min,
        power_max,
    })
}
