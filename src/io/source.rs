//! Measurement datasets and their key conventions.
//!
//! Automated test stations have written sweeps under three different
//! top-level layouts over the years. We read a JSON rendering of such a
//! dataset and decode one port from it:
//!
//! - `scanResults`: array indexed by port; each entry is an array of
//!   `[wavelength, power]` rows
//! - `scandata`: `{ "wavelength": [...], "power": [[ch0, ch1, ...], ...] }`
//! - `wavelength` + `power`: top-level axis plus a row-major power matrix
//!   (one row per sample, one column per port)
//!
//! Detection order follows that list. Each layout has its own decoder; the
//! `SourceFormat` enum dispatches to them.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::Trace;
use crate::error::AppError;
use crate::io::ingest::IngestedTrace;

/// A loaded dataset: top-level keys to values.
pub type Dataset = Map<String, Value>;

/// Extracts one port's sweep from a dataset.
pub trait TraceDecoder {
    fn decode(&self, dataset: &Dataset, port: usize) -> Result<Trace, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    ScanResults,
    ScanData,
    WavelengthPower,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 3] = [
        SourceFormat::ScanResults,
        SourceFormat::ScanData,
        SourceFormat::WavelengthPower,
    ];

    /// Top-level key that identifies the layout.
    pub fn key(self) -> &'static str {
        match self {
            SourceFormat::ScanResults => "scanResults",
            SourceFormat::ScanData => "scandata",
            SourceFormat::WavelengthPower => "wavelength",
        }
    }

    /// First layout whose key is present.
    pub fn detect(dataset: &Dataset) -> Option<Self> {
        Self::ALL.into_iter().find(|f| dataset.contains_key(f.key()))
    }
}

impl TraceDecoder for SourceFormat {
    fn decode(&self, dataset: &Dataset, port: usize) -> Result<Trace, AppError> {
        match self {
            SourceFormat::ScanResults => ScanResultsDecoder.decode(dataset, port),
            SourceFormat::ScanData => ScanDataDecoder.decode(dataset, port),
            SourceFormat::WavelengthPower => WavelengthPowerDecoder.decode(dataset, port),
        }
    }
}

pub struct ScanResultsDecoder;

impl TraceDecoder for ScanResultsDecoder {
    fn decode(&self, dataset: &Dataset, port: usize) -> Result<Trace, AppError> {
        let ports = field(dataset, "scanResults")?
            .as_array()
            .ok_or_else(|| malformed("`scanResults` must be an array of ports"))?;
        let rows = ports
            .get(port)
            .ok_or_else(|| port_out_of_range(port, ports.len()))?
            .as_array()
            .ok_or_else(|| malformed("`scanResults` port entry must be an array of rows"))?;

        let mut wavelength = Vec::with_capacity(rows.len());
        let mut power = Vec::with_capacity(rows.len());
        for row in rows {
            wavelength.push(cell(row, 0, "scanResults")?);
            power.push(cell(row, 1, "scanResults")?);
        }
        Ok(Trace::new(wavelength, power)?)
    }
}

pub struct ScanDataDecoder;

impl TraceDecoder for ScanDataDecoder {
    fn decode(&self, dataset: &Dataset, port: usize) -> Result<Trace, AppError> {
        let scandata = field(dataset, "scandata")?
            .as_object()
            .ok_or_else(|| malformed("`scandata` must be an object"))?;
        let wavelength = number_array(field(scandata, "wavelength")?, "scandata.wavelength")?;
        let power = matrix_column(field(scandata, "power")?, port, "scandata.power")?;
        Ok(Trace::new(wavelength, power)?)
    }
}

pub struct WavelengthPowerDecoder;

impl TraceDecoder for WavelengthPowerDecoder {
    fn decode(&self, dataset: &Dataset, port: usize) -> Result<Trace, AppError> {
        let wavelength = number_array(field(dataset, "wavelength")?, "wavelength")?;
        let power = matrix_column(field(dataset, "power")?, port, "power")?;
        Ok(Trace::new(wavelength, power)?)
    }
}

/// Read a dataset file.
pub fn read_dataset(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open dataset '{}': {e}", path.display())))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::new(2, format!("Invalid dataset JSON '{}': {e}", path.display())))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::new(
            2,
            format!("Dataset '{}' must be a JSON object.", path.display()),
        )),
    }
}

/// Detect the layout and decode `port`.
pub fn decode_trace(dataset: &Dataset, port: usize) -> Result<(SourceFormat, Trace), AppError> {
    let format = SourceFormat::detect(dataset).ok_or_else(|| {
        AppError::new(
            2,
            "Unrecognized dataset: none of `scanResults`, `scandata`, or `wavelength` keys were found.",
        )
    })?;
    let trace = format.decode(dataset, port)?;
    Ok((format, trace))
}

/// Load one port of a dataset file as an ingested trace.
pub fn load_dataset_trace(path: &Path, port: usize) -> Result<IngestedTrace, AppError> {
    let dataset = read_dataset(path)?;
    let (format, trace) = decode_trace(&dataset, port)?;
    log::debug!("'{}' uses the `{}` layout", path.display(), format.key());
    IngestedTrace::from_trace(trace, path.to_path_buf(), format!("{}[{port}]", format.key()))
}

fn field<'a>(map: &'a Dataset, key: &str) -> Result<&'a Value, AppError> {
    map.get(key)
        .ok_or_else(|| malformed(&format!("missing `{key}`")))
}

fn number(value: &Value, what: &str) -> Result<f64, AppError> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| malformed(&format!("non-numeric value in `{what}`")))
}

fn number_array(value: &Value, what: &str) -> Result<Vec<f64>, AppError> {
    value
        .as_array()
        .ok_or_else(|| malformed(&format!("`{what}` must be an array")))?
        .iter()
        .map(|v| number(v, what))
        .collect()
}

fn cell(row: &Value, col: usize, what: &str) -> Result<f64, AppError> {
    let v = row
        .as_array()
        .and_then(|r| r.get(col))
        .ok_or_else(|| malformed(&format!("`{what}` rows need at least {} columns", col + 1)))?;
    number(v, what)
}

/// Column `port` of a row-major matrix. A flat numeric array is a single channel.
fn matrix_column(value: &Value, port: usize, what: &str) -> Result<Vec<f64>, AppError> {
    let rows = value
        .as_array()
        .ok_or_else(|| malformed(&format!("`{what}` must be an array")))?;

    rows.iter()
        .map(|row| match row {
            Value::Array(cols) => match cols.get(port) {
                Some(v) => number(v, what),
                None => Err(port_out_of_range(port, cols.len())),
            },
            _ if port == 0 => number(row, what),
            _ => Err(port_out_of_range(port, 1)),
        })
        .collect()
}

fn malformed(detail: &str) -> AppError {
    AppError::new(2, format!("Malformed dataset: {detail}."))
}

fn port_out_of_range(port: usize, available: usize) -> AppError {
    AppError::new(
        2,
        format!("Port {port} is out of range: dataset has {available} port(s)."),
    )
}
