//! Synthetic sweeps for demos, the TUI, and tests.
//!
//! Shapes are deliberately simple but exercise every correction:
//!
//! - `reference_sweep`: a fiber loop-back through two grating couplers
//!   (parabolic in dB, peak near 1550 nm)
//! - `ring_sweep`: the same coupler envelope with periodic ring resonances
//! - `passband_sweep`: a filter pass-band with a known 3 dB width
//! - `bragg_sweep`: coupler envelope with a deep Bragg stop band and side lobes
//! - `cutback_family`: loop-backs with `count · loss_per_unit` extra loss
//!
//! All generators are deterministic for a given `SampleConfig::seed`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{SampleConfig, Trace, TraceFamily};
use crate::error::AppError;

/// Coupler peak transmission (dB) of the loop-back reference.
const COUPLER_PEAK_DB: f64 = -7.0;
/// Coupler peak wavelength (nm).
const COUPLER_CENTER_NM: f64 = 1550.0;
/// Coupler 1 dB half width (nm).
const COUPLER_HALF_WIDTH_NM: f64 = 18.0;

/// Free spectral range of the synthetic ring (nm).
const RING_FSR_NM: f64 = 7.5;
const RING_DEPTH_DB: f64 = 15.0;
const RING_HWHM_NM: f64 = 0.08;

/// Bragg stop band (nm).
const BRAGG_CENTER_NM: f64 = 1552.0;
const BRAGG_HALF_WIDTH_NM: f64 = 4.0;
const BRAGG_DEPTH_DB: f64 = 30.0;

/// Evenly spaced wavelength axis.
pub fn wavelength_axis(config: &SampleConfig) -> Result<Vec<f64>, AppError> {
    validate(config)?;
    let n = config.points;
    let span = config.wavelength_stop - config.wavelength_start;
    Ok((0..n)
        .map(|i| config.wavelength_start + span * i as f64 / (n as f64 - 1.0))
        .collect())
}

/// Grating-coupler envelope (dB) at `w` (nm).
pub fn coupler_envelope(w: f64) -> f64 {
    let u = (w - COUPLER_CENTER_NM) / COUPLER_HALF_WIDTH_NM;
    COUPLER_PEAK_DB - u * u
}

pub fn reference_sweep(config: &SampleConfig) -> Result<Trace, AppError> {
    synthesize(config, 0x5eed_0001, coupler_envelope)
}

pub fn ring_sweep(config: &SampleConfig) -> Result<Trace, AppError> {
    synthesize(config, 0x5eed_0002, |w| {
        let phase = (w - COUPLER_CENTER_NM) / RING_FSR_NM;
        let detune = (phase - phase.round()) * RING_FSR_NM;
        let dip = RING_DEPTH_DB / (1.0 + (detune / RING_HWHM_NM).powi(2));
        coupler_envelope(w) - dip
    })
}

/// Parabolic-in-dB pass-band: exactly `width_3db` wide at 3 dB below the peak.
pub fn passband_sweep(config: &SampleConfig, center: f64, width_3db: f64) -> Result<Trace, AppError> {
    if !(width_3db.is_finite() && width_3db > 0.0) {
        return Err(AppError::new(2, "Pass-band width must be > 0."));
    }
    let k = 3.0 / (width_3db / 2.0).powi(2);
    synthesize(config, 0x5eed_0003, move |w| -1.5 - k * (w - center).powi(2))
}

pub fn bragg_sweep(config: &SampleConfig) -> Result<Trace, AppError> {
    synthesize(config, 0x5eed_0004, |w| {
        let x = (w - BRAGG_CENTER_NM) / BRAGG_HALF_WIDTH_NM;
        let reflection = if x.abs() <= 1.0 {
            BRAGG_DEPTH_DB
        } else {
            // Side lobes decay away from the stop band.
            let lobe = (std::f64::consts::PI * x).sin().powi(2);
            BRAGG_DEPTH_DB * 0.5 * lobe / (x * x)
        };
        coupler_envelope(w) - reflection
    })
}

/// Loop-back family with `count · loss_per_unit` dB of extra loss per trace.
pub fn cutback_family(config: &SampleConfig, counts: &[u32], loss_per_unit: f64) -> Result<TraceFamily, AppError> {
    if counts.is_empty() {
        return Err(AppError::new(2, "Cutback family needs at least one unit count."));
    }
    let mut traces = Vec::with_capacity(counts.len());
    for (i, &count) in counts.iter().enumerate() {
        let salt = 0x5eed_1000 + i as u64;
        let trace = synthesize(config, salt, |w| coupler_envelope(w) - loss_per_unit * count as f64)?;
        traces.push(trace);
    }
    Ok(TraceFamily::new(traces, counts.to_vec())?)
}

fn synthesize(config: &SampleConfig, salt: u64, shape: impl Fn(f64) -> f64) -> Result<Trace, AppError> {
    let wavelength = wavelength_axis(config)?;
    let mut rng = StdRng::seed_from_u64(config.seed ^ salt);
    let normal = Normal::new(0.0, config.noise_db)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let power = wavelength
        .iter()
        .map(|&w| shape(w) + normal.sample(&mut rng))
        .collect();
    Ok(Trace::new(wavelength, power)?)
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.points < 2 {
        return Err(AppError::new(2, "Sample sweep needs at least 2 points."));
    }
    if !(config.wavelength_start.is_finite()
        && config.wavelength_stop.is_finite()
        && config.wavelength_stop > config.wavelength_start)
    {
        return Err(AppError::new(2, "Invalid wavelength range for sample generation."));
    }
    if !(config.noise_db.is_finite() && config.noise_db >= 0.0) {
        return Err(AppError::new(2, "Noise level must be finite and >= 0."));
    }
    Ok(())
}
