//! Flatten a trace against its own smooth trend.
//!
//! Useful for periodic responses (rings, MZIs) where the fiber/grating-coupler
//! envelope should be removed without a separate reference measurement.

use crate::domain::{CorrectionResult, Trace};
use crate::error::AnalysisError;
use crate::math::trend;

/// Subtract a degree-`fit_order` trend from the trace.
///
/// The flattened curve is shifted by `max(trend) - max(power)` so that its
/// level stays tied to the input peak.
pub fn baseline_correction(trace: &Trace, fit_order: usize) -> Result<CorrectionResult, AnalysisError> {
    let fit_curve = trend(&trace.wavelength, &trace.power, fit_order)?;

    let offset = max_value(&fit_curve) - max_value(&trace.power);
    let corrected_power = trace
        .power
        .iter()
        .zip(&fit_curve)
        .map(|(p, f)| p - f + offset)
        .collect();

    Ok(CorrectionResult {
        corrected_power,
        fit_curve,
    })
}

pub(crate) fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BASELINE_FIT_ORDER;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1500.0 + 0.1 * i as f64).collect()
    }

    #[test]
    fn flat_input_stays_flat_with_zero_offset() {
        let wl = axis(100);
        let trace = Trace::new(wl, vec![-12.5; 100]).unwrap();
        let out = baseline_correction(&trace, BASELINE_FIT_ORDER).unwrap();

        for f in &out.fit_curve {
            assert!((f + 12.5).abs() < 1e-9);
        }
        // Trend equals the input and the peak offset is zero: nothing remains.
        for c in &out.corrected_power {
            assert!(c.abs() < 1e-9, "{c}");
        }
    }

    #[test]
    fn quartic_trend_is_removed() {
        let wl = axis(401);
        let m = crate::math::mean(&wl);
        let ripple: Vec<f64> = (0..401).map(|i| 0.3 * (i as f64 * 0.9).sin()).collect();
        let power: Vec<f64> = wl
            .iter()
            .zip(&ripple)
            .map(|(&w, r)| {
                let u = (w - m) / 20.0;
                -6.0 - 4.0 * u * u + 0.5 * u.powi(4) + r
            })
            .collect();
        let trace = Trace::new(wl, power.clone()).unwrap();
        let out = baseline_correction(&trace, BASELINE_FIT_ORDER).unwrap();

        // What is left is the ripple, shifted by a constant.
        let shift = out.corrected_power[0] - ripple[0];
        for (c, r) in out.corrected_power.iter().zip(&ripple) {
            assert!((c - r - shift).abs() < 0.05, "{c} vs {r}");
        }
        let expected_shift = max_value(&out.fit_curve) - max_value(&power);
        assert!((shift - expected_shift).abs() < 0.05);
    }

    #[test]
    fn short_trace_is_rejected() {
        let trace = Trace::new(axis(4), vec![0.0; 4]).unwrap();
        let err = baseline_correction(&trace, BASELINE_FIT_ORDER).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { needed: 5, got: 4, .. }));
    }
}
