//! Pass-band width around the peak of a trace.

use crate::domain::{BandwidthResult, Trace};
use crate::error::{AnalysisError, BandEdge};

/// Index of the sample nearest `value` (first one on ties).
pub fn find_nearest(values: &[f64], value: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        let d = (v - value).abs();
        match best {
            Some((_, bd)) if d >= bd => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Width of the region within `threshold` dB of the peak.
///
/// Edges are the first out-of-band samples on each side of the peak, so the
/// reported width spans from just outside the band to just outside the band.
pub fn bandwidth(trace: &Trace, threshold: f64) -> Result<BandwidthResult, AnalysisError> {
    if !(threshold.is_finite() && threshold >= 0.0) {
        return Err(AnalysisError::InvalidParameter(format!(
            "bandwidth threshold must be a non-negative number of dB, got {threshold}"
        )));
    }

    trace.check_shape()?;

    let power = &trace.power;
    let peak = power.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let center = find_nearest(power, peak).ok_or(AnalysisError::InsufficientData {
        needed: 1,
        got: 0,
        context: "bandwidth",
    })?;

    let floor = peak - threshold;
    let in_band = |i: usize| power[i] > floor;

    let mut left = center;
    while in_band(left) {
        if left == 0 {
            return Err(AnalysisError::BandOutOfRange { edge: BandEdge::Left });
        }
        left -= 1;
    }

    let mut right = center;
    while in_band(right) {
        if right + 1 == power.len() {
            return Err(AnalysisError::BandOutOfRange { edge: BandEdge::Right });
        }
        right += 1;
    }

    let wl = &trace.wavelength;
    Ok(BandwidthResult {
        bandwidth: wl[right] - wl[left],
        central_wavelength: (wl[right] + wl[left]) / 2.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_BANDWIDTH_THRESHOLD;

    const DX: f64 = 0.02;

    fn gaussian_db(center: f64, fwhm_3db: f64) -> Trace {
        // In dB a Gaussian is a parabola: p(λ) = -k (λ - c)^2, with the 3 dB
        // points at c ± fwhm/2.
        let k = 3.0 / (fwhm_3db / 2.0).powi(2);
        let wl: Vec<f64> = (0..2001).map(|i| 1530.0 + DX * i as f64).collect();
        let power = wl.iter().map(|&w| -2.0 - k * (w - center).powi(2)).collect();
        Trace::new(wl, power).unwrap()
    }

    #[test]
    fn recovers_width_and_center_of_synthetic_peak() {
        let trace = gaussian_db(1550.0, 12.0);
        let out = bandwidth(&trace, DEFAULT_BANDWIDTH_THRESHOLD).unwrap();

        // Each edge is the first sample outside the band: at most one spacing
        // past the true crossing on either side.
        assert!(out.bandwidth >= 12.0 - 1e-9, "{}", out.bandwidth);
        assert!(out.bandwidth <= 12.0 + 2.0 * DX + 1e-9, "{}", out.bandwidth);
        assert!((out.central_wavelength - 1550.0).abs() <= DX, "{}", out.central_wavelength);
    }

    #[test]
    fn zero_threshold_collapses_to_the_peak() {
        let trace = gaussian_db(1551.0, 6.0);
        let out = bandwidth(&trace, 0.0).unwrap();
        assert_eq!(out.bandwidth, 0.0);
        assert!((out.central_wavelength - 1551.0).abs() < 1e-9);
    }

    #[test]
    fn monotonic_trace_runs_off_the_right_edge() {
        let wl: Vec<f64> = (0..50).map(|i| 1500.0 + i as f64).collect();
        let power: Vec<f64> = (0..50).map(|i| -40.0 + 0.5 * i as f64).collect();
        let trace = Trace::new(wl, power).unwrap();
        let err = bandwidth(&trace, DEFAULT_BANDWIDTH_THRESHOLD).unwrap_err();
        assert_eq!(err, AnalysisError::BandOutOfRange { edge: BandEdge::Right });
    }

    #[test]
    fn falling_trace_runs_off_the_left_edge() {
        let wl: Vec<f64> = (0..50).map(|i| 1500.0 + i as f64).collect();
        let power: Vec<f64> = (0..50).map(|i| -0.5 * i as f64).collect();
        let trace = Trace::new(wl, power).unwrap();
        let err = bandwidth(&trace, DEFAULT_BANDWIDTH_THRESHOLD).unwrap_err();
        assert_eq!(err, AnalysisError::BandOutOfRange { edge: BandEdge::Left });
    }

    #[test]
    fn empty_trace_is_insufficient() {
        let trace = Trace::new(vec![], vec![]).unwrap();
        assert!(matches!(
            bandwidth(&trace, 3.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn negative_threshold_is_invalid() {
        let trace = gaussian_db(1550.0, 12.0);
        assert!(matches!(bandwidth(&trace, -1.0), Err(AnalysisError::InvalidParameter(_))));
    }

    #[test]
    fn ragged_trace_is_shape_mismatch() {
        let trace = Trace {
            wavelength: vec![1549.0, 1550.0, 1551.0],
            power: vec![-9.0, -4.0, 0.0, -4.0, -9.0],
        };
        assert_eq!(
            bandwidth(&trace, 3.0).unwrap_err(),
            AnalysisError::ShapeMismatch {
                expected: 3,
                got: 5,
                context: "trace power vs wavelength",
            }
        );
    }

    #[test]
    fn nearest_prefers_first_match() {
        assert_eq!(find_nearest(&[1.0, 3.0, 3.0], 3.0), Some(1));
        assert_eq!(find_nearest(&[], 3.0), None);
    }
}
