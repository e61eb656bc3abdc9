//! Envelope calibration for non-periodic, resonance-laden responses.
//!
//! A plain polynomial fit of a Bragg-grating reference is dragged down by its
//! deep stop-band dips. Instead we pick reference samples that only follow the
//! smooth upper trend (the envelope), fit those, and calibrate against that.
//!
//! Envelope scan
//! -------------
//! The reference is visited at `segments` equal index steps
//! (`step = len / segments`). With a cursor pair `(initial, next)`:
//!
//! - if `|p[initial·step] - p[next·step]| < difference_tol`, the `initial`
//!   sample is accepted and both cursors move on
//! - otherwise `next` runs ahead while the difference stays above the
//!   tolerance, the skipped samples are dropped as a dip, and scanning resumes
//!   from where `next` stopped
//!
//! The scan stops once `next·step` would leave the trace.

use crate::correct::calibrate::{ensure_same_length, subtract};
use crate::domain::{CorrectionResult, EnvelopeConfig, EnvelopePoint, Trace};
use crate::error::AnalysisError;
use crate::math::{evaluate_centered, fit_centered, trend};

/// Run the envelope scan over `reference` and return the accepted samples,
/// in increasing index order.
pub fn envelope_points(reference: &Trace, config: &EnvelopeConfig) -> Result<Vec<EnvelopePoint>, AnalysisError> {
    if config.segments == 0 {
        return Err(AnalysisError::InvalidParameter(
            "envelope segments must be > 0".to_string(),
        ));
    }
    if !config.difference_tol.is_finite() {
        return Err(AnalysisError::InvalidParameter(
            "envelope difference tolerance must be finite".to_string(),
        ));
    }

    reference.check_shape()?;

    let n = reference.len();
    let step = n / config.segments;
    if step == 0 {
        return Err(AnalysisError::InsufficientData {
            needed: config.segments,
            got: n,
            context: "envelope segmentation",
        });
    }

    let power = &reference.power;
    let tol = config.difference_tol;

    let mut points = Vec::new();
    let mut initial = 0usize;
    let mut next = 1usize;

    for _ in 0..config.segments {
        if next * step >= n {
            break;
        }

        let current = power[initial * step];
        let mut ahead = power[next * step];

        if (current - ahead).abs() < tol {
            let index = initial * step;
            points.push(EnvelopePoint {
                index,
                wavelength: reference.wavelength[index],
                power: current,
            });
            initial += 1;
            next += 1;
        } else {
            while (current - ahead).abs() > tol && (next + 2) * step < n {
                next += 1;
                ahead = power[next * step];
            }
            initial = next;
            next += 1;
        }
    }

    Ok(points)
}

/// Calibrate `input` against a polynomial fit of the reference's envelope.
///
/// The envelope fit is centered on the accepted points' own mean wavelength
/// and evaluated over the full reference axis (centered on the reference
/// mean). `fit_curve` is that evaluated envelope.
pub fn calibrate_envelope(
    input: &Trace,
    reference: &Trace,
    config: &EnvelopeConfig,
) -> Result<CorrectionResult, AnalysisError> {
    ensure_same_length(input, reference)?;

    let points = envelope_points(reference, config)?;
    if points.len() <= config.fit_order {
        return Err(AnalysisError::InsufficientData {
            needed: config.fit_order + 1,
            got: points.len(),
            context: "envelope fit",
        });
    }

    let env_wavelength: Vec<f64> = points.iter().map(|p| p.wavelength).collect();
    let env_power: Vec<f64> = points.iter().map(|p| p.power).collect();

    let envelope_fit = fit_centered(&env_wavelength, &env_power, config.fit_order)?;
    let fit_curve = evaluate_centered(&envelope_fit, &reference.wavelength);

    // The input's own trend is fitted too, but never enters the result.
    // Kept so that inputs too short for the fit order are rejected.
    let _input_trend = trend(&input.wavelength, &input.power, config.fit_order)?;

    let corrected_power = subtract(&input.power, &fit_curve);

    Ok(CorrectionResult {
        corrected_power,
        fit_curve,
    })
}
