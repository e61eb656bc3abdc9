//! Reference calibration: remove a setup's loss trend, measured on a
//! reference structure, from a device-under-test trace.

use crate::domain::{CorrectionResult, Trace};
use crate::error::AnalysisError;
use crate::math::trend;

/// Subtract the reference trace's degree-`fit_order` trend from `input`.
///
/// Both traces must be sampled on the same axis; nothing is resampled.
pub fn calibrate(input: &Trace, reference: &Trace, fit_order: usize) -> Result<CorrectionResult, AnalysisError> {
    ensure_same_length(input, reference)?;

    let fit_curve = trend(&reference.wavelength, &reference.power, fit_order)?;
    let corrected_power = subtract(&input.power, &fit_curve);

    Ok(CorrectionResult {
        corrected_power,
        fit_curve,
    })
}

pub(crate) fn ensure_same_length(input: &Trace, reference: &Trace) -> Result<(), AnalysisError> {
    if input.len() != reference.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: reference.len(),
            got: input.len(),
            context: "input vs reference trace",
        });
    }
    Ok(())
}

pub(crate) fn subtract(power: &[f64], curve: &[f64]) -> Vec<f64> {
    power.iter().zip(curve).map(|(p, c)| p - c).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CALIBRATION_FIT_ORDER;
    use crate::math::{evaluate_centered, fit_centered};

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1520.0 + 0.05 * i as f64).collect()
    }

    #[test]
    fn subtraction_law_holds_exactly() {
        let wl = axis(600);
        let reference: Vec<f64> = wl
            .iter()
            .enumerate()
            .map(|(i, &w)| -8.0 - 1e-3 * (w - 1535.0).powi(2) + 0.01 * ((i * 7) % 5) as f64)
            .collect();
        let input: Vec<f64> = wl.iter().map(|&w| -20.0 + 0.01 * (w - 1530.0)).collect();

        let reference = Trace::new(wl.clone(), reference).unwrap();
        let input = Trace::new(wl, input).unwrap();
        let out = calibrate(&input, &reference, CALIBRATION_FIT_ORDER).unwrap();

        let fit = fit_centered(&reference.wavelength, &reference.power, CALIBRATION_FIT_ORDER).unwrap();
        let expected_curve = evaluate_centered(&fit, &reference.wavelength);
        assert_eq!(out.fit_curve, expected_curve);
        for ((c, p), f) in out.corrected_power.iter().zip(&input.power).zip(&expected_curve) {
            assert_eq!(*c, p - f);
        }
    }

    #[test]
    fn identical_smooth_traces_calibrate_to_zero() {
        let wl = axis(300);
        let power: Vec<f64> = wl.iter().map(|&w| -5.0 - 2e-3 * (w - 1527.0).powi(2)).collect();
        let trace = Trace::new(wl, power).unwrap();
        let out = calibrate(&trace, &trace, CALIBRATION_FIT_ORDER).unwrap();
        for c in &out.corrected_power {
            assert!(c.abs() < 1e-8, "{c}");
        }
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let a = Trace::new(axis(20), vec![0.0; 20]).unwrap();
        let b = Trace::new(axis(21), vec![0.0; 21]).unwrap();
        let err = calibrate(&a, &b, CALIBRATION_FIT_ORDER).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { expected: 21, got: 20, .. }));
    }
}
