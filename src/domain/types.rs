//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during correction and extraction
//! - exported to JSON/CSV
//! - rendered by the report/plot/TUI front-ends

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Polynomial order used to flatten a trace against itself.
pub const BASELINE_FIT_ORDER: usize = 4;
/// Polynomial order used to model a reference (calibration) trace.
pub const CALIBRATION_FIT_ORDER: usize = 8;
/// Polynomial order used to smooth each cutback trace.
pub const CUTBACK_FIT_ORDER: usize = 8;
/// Polynomial order of the envelope fit.
pub const ENVELOPE_FIT_ORDER: usize = 4;
/// Number of equal-width index segments scanned for envelope points.
pub const DEFAULT_SEGMENTS: usize = 55;
/// Maximum power step (dB) between neighbouring envelope samples.
pub const DEFAULT_DIFFERENCE_TOL: f64 = 8.0;
/// Power drop (dB) below the peak that defines the pass-band.
pub const DEFAULT_BANDWIDTH_THRESHOLD: f64 = 3.0;

/// One measurement sweep: power (dB/dBm) sampled on an ascending wavelength axis.
///
/// Deserialization goes through `Trace::new`, so a document with ragged
/// columns is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TraceColumns")]
pub struct Trace {
    pub wavelength: Vec<f64>,
    pub power: Vec<f64>,
}

#[derive(Deserialize)]
struct TraceColumns {
    wavelength: Vec<f64>,
    power: Vec<f64>,
}

impl TryFrom<TraceColumns> for Trace {
    type Error = AnalysisError;

    fn try_from(columns: TraceColumns) -> Result<Self, Self::Error> {
        Trace::new(columns.wavelength, columns.power)
    }
}

impl Trace {
    pub fn new(wavelength: Vec<f64>, power: Vec<f64>) -> Result<Self, AnalysisError> {
        if wavelength.len() != power.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: wavelength.len(),
                got: power.len(),
                context: "trace power vs wavelength",
            });
        }
        Ok(Self { wavelength, power })
    }

    pub fn len(&self) -> usize {
        self.power.len()
    }

    /// Re-checks the column lengths (the fields are public, so a literal can skip `new`).
    pub fn check_shape(&self) -> Result<(), AnalysisError> {
        if self.wavelength.len() != self.power.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: self.wavelength.len(),
                got: self.power.len(),
                context: "trace power vs wavelength",
            });
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.power.is_empty()
    }

    /// Returns a copy of this trace with the power column replaced.
    pub fn with_power(&self, power: Vec<f64>) -> Result<Self, AnalysisError> {
        Trace::new(self.wavelength.clone(), power)
    }

    /// `true` when the wavelength axis is strictly increasing.
    pub fn is_ascending(&self) -> bool {
        self.wavelength.windows(2).all(|w| w[1] > w[0])
    }
}

/// Traces from cutback structures with different repeated-unit counts.
///
/// All traces share one wavelength axis; `counts[i]` belongs to `traces[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceFamily {
    pub traces: Vec<Trace>,
    pub counts: Vec<u32>,
}

impl TraceFamily {
    pub fn new(traces: Vec<Trace>, counts: Vec<u32>) -> Result<Self, AnalysisError> {
        if traces.len() != counts.len() {
            return Err(AnalysisError::ShapeMismatch {
                expected: traces.len(),
                got: counts.len(),
                context: "cutback unit counts",
            });
        }
        if let Some(first) = traces.first() {
            first.check_shape()?;
            for trace in &traces[1..] {
                trace.check_shape()?;
                if trace.len() != first.len() {
                    return Err(AnalysisError::ShapeMismatch {
                        expected: first.len(),
                        got: trace.len(),
                        context: "cutback trace length",
                    });
                }
                if trace.wavelength != first.wavelength {
                    return Err(AnalysisError::ShapeMismatch {
                        expected: first.len(),
                        got: trace.len(),
                        context: "cutback wavelength axis",
                    });
                }
            }
        }
        Ok(Self { traces, counts })
    }

    /// The shared wavelength axis (taken from the first trace).
    pub fn wavelength(&self) -> &[f64] {
        self.traces
            .first()
            .map(|t| t.wavelength.as_slice())
            .unwrap_or(&[])
    }
}

/// Least-squares polynomial coefficients, ascending powers (`c0 + c1·x + …`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    pub coefficients: Vec<f64>,
    pub order: usize,
}

/// A corrected power trace plus the trend that was removed from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionResult {
    pub corrected_power: Vec<f64>,
    pub fit_curve: Vec<f64>,
}

/// Per-unit insertion loss (dB/unit) extracted by the cutback method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertionLossProfile {
    /// Slope at the requested wavelength (from the smoothed traces).
    pub loss_at_wavelength: f64,
    /// Slope per wavelength sample, smoothed traces.
    pub loss_vs_wavelength: Vec<f64>,
    /// Slope per wavelength sample, raw traces.
    pub loss_vs_wavelength_raw: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandwidthResult {
    pub bandwidth: f64,
    pub central_wavelength: f64,
}

/// A reference sample accepted as part of the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopePoint {
    /// Sample index into the reference trace.
    pub index: usize,
    pub wavelength: f64,
    pub power: f64,
}

/// Tuning knobs for envelope calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    pub segments: usize,
    /// dB; neighbouring segment samples differing by at least this much are
    /// treated as a resonance dip.
    pub difference_tol: f64,
    pub fit_order: usize,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            difference_tol: DEFAULT_DIFFERENCE_TOL,
            fit_order: ENVELOPE_FIT_ORDER,
        }
    }
}

/// Which analysis a run (or the TUI) performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Baseline,
    Calibrate,
    Envelope,
    Cutback,
    Bandwidth,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Baseline,
        Operation::Calibrate,
        Operation::Envelope,
        Operation::Cutback,
        Operation::Bandwidth,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Operation::Baseline => "baseline correction",
            Operation::Calibrate => "reference calibration",
            Operation::Envelope => "envelope calibration",
            Operation::Cutback => "cutback",
            Operation::Bandwidth => "bandwidth",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Operation::Baseline => Operation::Calibrate,
            Operation::Calibrate => Operation::Envelope,
            Operation::Envelope => Operation::Cutback,
            Operation::Cutback => Operation::Bandwidth,
            Operation::Bandwidth => Operation::Baseline,
        }
    }
}

/// What a single analysis run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisOutput {
    /// Baseline, reference, or envelope correction of one trace.
    Correction {
        /// The uncorrected input.
        trace: Trace,
        result: CorrectionResult,
        /// Accepted envelope samples (envelope calibration only).
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        envelope: Vec<EnvelopePoint>,
        /// Optional pass-band of the corrected trace.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bandwidth: Option<BandwidthResult>,
    },
    Cutback {
        wavelength: Vec<f64>,
        counts: Vec<u32>,
        target_wavelength: f64,
        profile: InsertionLossProfile,
    },
    Bandwidth {
        trace: Trace,
        threshold: f64,
        result: BandwidthResult,
    },
}

impl AnalysisOutput {
    /// Checks that every per-sample sequence lines up with its axis.
    pub fn check_shape(&self) -> Result<(), AnalysisError> {
        let same = |expected: usize, got: usize, context: &'static str| {
            if expected == got {
                Ok(())
            } else {
                Err(AnalysisError::ShapeMismatch { expected, got, context })
            }
        };

        match self {
            AnalysisOutput::Correction { trace, result, .. } => {
                trace.check_shape()?;
                same(trace.len(), result.fit_curve.len(), "fit curve")?;
                same(trace.len(), result.corrected_power.len(), "corrected power")
            }
            AnalysisOutput::Cutback { wavelength, profile, .. } => {
                same(wavelength.len(), profile.loss_vs_wavelength.len(), "loss vs wavelength")?;
                same(wavelength.len(), profile.loss_vs_wavelength_raw.len(), "raw loss vs wavelength")
            }
            AnalysisOutput::Bandwidth { trace, .. } => trace.check_shape(),
        }
    }
}

/// A saved analysis result (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub operation: Operation,
    /// Input descriptions (`path#channel`).
    pub inputs: Vec<String>,
    pub output: AnalysisOutput,
}

/// Output options shared by every analysis subcommand.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    /// Per-sample CSV table.
    pub export_csv: Option<PathBuf>,
    /// Result document (JSON).
    pub export_json: Option<PathBuf>,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            plot: true,
            plot_width: 100,
            plot_height: 25,
            export_csv: None,
            export_json: None,
        }
    }
}

/// Parameters for synthetic sweep generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub seed: u64,
    pub points: usize,
    /// Standard deviation of the additive noise (dB).
    pub noise_db: f64,
    /// Sweep start (nm).
    pub wavelength_start: f64,
    /// Sweep stop (nm).
    pub wavelength_stop: f64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            points: 801,
            noise_db: 0.05,
            wavelength_start: 1500.0,
            wavelength_stop: 1600.0,
        }
    }
}
