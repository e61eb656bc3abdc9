//! Command-line parsing for the `sweep` spectral post-processing tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! numeric core. Every operation parameter has a flag whose default equals the
//! library default, so `sweep baseline trace.csv` does what
//! `baseline_correction(trace, 4)` does.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    BASELINE_FIT_ORDER, CALIBRATION_FIT_ORDER, CUTBACK_FIT_ORDER, DEFAULT_BANDWIDTH_THRESHOLD,
    DEFAULT_DIFFERENCE_TOL, DEFAULT_SEGMENTS, ENVELOPE_FIT_ORDER, EnvelopeConfig, Operation,
    OutputOptions, SampleConfig,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sweep", version, about = "Spectral sweep calibration and extraction")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug). `RUST_LOG` overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remove the polynomial trend of a single trace.
    Baseline(BaselineArgs),
    /// Subtract the polynomial trend of a reference trace.
    Calibrate(CalibrateArgs),
    /// Calibrate against the upper envelope of a resonance-laden reference.
    Envelope(EnvelopeArgs),
    /// Extract per-unit insertion loss from a cutback family.
    Cutback(CutbackArgs),
    /// Measure the pass-band width below the peak.
    Bandwidth(BandwidthArgs),
    /// Run every operation on seeded synthetic sweeps.
    Demo(DemoArgs),
    /// Plot a previously exported result JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI on synthetic sweeps.
    Tui(TuiArgs),
}

/// A trace file plus the channel to read from it.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Sweep file (CSV with a `wavelength` column, or a `.json` dataset).
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// Channel (detector port) to read.
    #[arg(long, default_value_t = 0)]
    pub port: usize,
}

/// A reference trace for calibration.
#[derive(Debug, Args, Clone)]
pub struct ReferenceArgs {
    /// Reference sweep file.
    #[arg(long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Channel to read from the reference file.
    #[arg(long, default_value_t = 0)]
    pub reference_port: usize,
}

/// Plot + export options shared by every analysis subcommand.
#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the per-sample table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the result document to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

impl OutputArgs {
    pub fn to_options(&self) -> OutputOptions {
        OutputOptions {
            plot: !self.no_plot,
            plot_width: self.width,
            plot_height: self.height,
            export_csv: self.export.clone(),
            export_json: self.export_json.clone(),
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct BaselineArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Polynomial order of the trend.
    #[arg(long, default_value_t = BASELINE_FIT_ORDER)]
    pub order: usize,

    /// Also extract the bandwidth (dB below peak) of the corrected trace.
    #[arg(long, value_name = "DB")]
    pub bandwidth: Option<f64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Polynomial order of the reference trend.
    #[arg(long, default_value_t = CALIBRATION_FIT_ORDER)]
    pub order: usize,

    /// Also extract the bandwidth (dB below peak) of the corrected trace.
    #[arg(long, value_name = "DB")]
    pub bandwidth: Option<f64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct EnvelopeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    /// Number of equal index steps the reference is scanned in.
    #[arg(long, env = "SWEEP_SEGMENTS", default_value_t = DEFAULT_SEGMENTS)]
    pub segments: usize,

    /// Largest power difference (dB) between envelope samples.
    #[arg(long, env = "SWEEP_DIFFERENCE_TOL", default_value_t = DEFAULT_DIFFERENCE_TOL)]
    pub tolerance: f64,

    /// Polynomial order of the envelope fit.
    #[arg(long, default_value_t = ENVELOPE_FIT_ORDER)]
    pub order: usize,

    /// Also extract the bandwidth (dB below peak) of the corrected trace.
    #[arg(long, value_name = "DB")]
    pub bandwidth: Option<f64>,

    #[command(flatten)]
    pub output: OutputArgs,
}

impl EnvelopeArgs {
    pub fn envelope_config(&self) -> EnvelopeConfig {
        EnvelopeConfig {
            segments: self.segments,
            difference_tol: self.tolerance,
            fit_order: self.order,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct CutbackArgs {
    /// Sweep files, one per device count (same wavelength axis).
    #[arg(value_name = "FILE", num_args = 2.., required = true)]
    pub inputs: Vec<PathBuf>,

    /// Channel to read from every file.
    #[arg(long, default_value_t = 0)]
    pub port: usize,

    /// Device counts, one per file (e.g. "0,5,10").
    #[arg(long)]
    pub counts: String,

    /// Wavelength to report the loss at (must be a sampled wavelength).
    #[arg(long)]
    pub wavelength: f64,

    /// Polynomial order used to smooth each trace.
    #[arg(long, default_value_t = CUTBACK_FIT_ORDER)]
    pub order: usize,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BandwidthArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Drop below the peak (dB) that defines the band edges.
    #[arg(long, default_value_t = DEFAULT_BANDWIDTH_THRESHOLD)]
    pub threshold: f64,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Synthetic sweep parameters.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Random seed for sweep generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Noise standard deviation (dB).
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Samples per sweep.
    #[arg(long, default_value_t = 801)]
    pub points: usize,
}

impl SampleArgs {
    pub fn sample_config(&self) -> SampleConfig {
        SampleConfig {
            seed: self.seed,
            points: self.points,
            noise_db: self.noise,
            ..SampleConfig::default()
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DemoArgs {
    #[command(flatten)]
    pub sample: SampleArgs,

    /// Run only this operation.
    #[arg(long, value_enum)]
    pub operation: Option<Operation>,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for plotting a saved result.
#[derive(Debug, Args, Clone)]
pub struct PlotArgs {
    /// Result JSON file produced by `--export-json`.
    #[arg(long, value_name = "JSON")]
    pub result: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub sample: SampleArgs,

    /// Operation shown first.
    #[arg(long, value_enum, default_value_t = Operation::Baseline)]
    pub operation: Operation,
}

/// Initialise `env_logger` from the `-v` count; `RUST_LOG` still wins.
pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}
