//! Cutback insertion-loss extraction.
//!
//! A cutback family repeats the device under test `N` times in series for a
//! few different `N`. At every wavelength the measured power is (ideally)
//! affine in `N`: the intercept is coupling/fiber loss, the slope is the loss
//! of a single unit. We regress power against unit count at every wavelength
//! sample, once on the polynomial-smoothed traces and once on the raw ones.

use rayon::prelude::*;

use crate::domain::{InsertionLossProfile, TraceFamily};
use crate::error::AnalysisError;
use crate::math::{linear_slope, trend};

/// Extract per-unit insertion loss (dB/unit) across the shared wavelength axis.
///
/// `wavelength` must be one of the sampled wavelengths exactly.
pub fn cutback(
    family: &TraceFamily,
    wavelength: f64,
    fit_order: usize,
) -> Result<InsertionLossProfile, AnalysisError> {
    if family.traces.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: family.traces.len(),
            context: "cutback family",
        });
    }

    let axis = family.wavelength();
    let index = axis
        .iter()
        .position(|&w| w == wavelength)
        .ok_or(AnalysisError::WavelengthNotFound { wavelength })?;

    let fitted: Vec<Vec<f64>> = family
        .traces
        .iter()
        .map(|t| trend(axis, &t.power, fit_order))
        .collect::<Result<_, _>>()?;
    let raw: Vec<&[f64]> = family.traces.iter().map(|t| t.power.as_slice()).collect();

    let counts: Vec<f64> = family.counts.iter().map(|&c| c as f64).collect();

    let loss_vs_wavelength = slopes_per_sample(&counts, &fitted, axis.len())?;
    let loss_vs_wavelength_raw = slopes_per_sample(&counts, &raw, axis.len())?;

    Ok(InsertionLossProfile {
        loss_at_wavelength: loss_vs_wavelength[index],
        loss_vs_wavelength,
        loss_vs_wavelength_raw,
    })
}

/// Transpose `[trace][sample]` to `[sample][trace]` and regress each column on `counts`.
fn slopes_per_sample<T: AsRef<[f64]> + Sync>(
    counts: &[f64],
    rows: &[T],
    n_samples: usize,
) -> Result<Vec<f64>, AnalysisError> {
    (0..n_samples)
        .into_par_iter()
        .map(|i| {
            let column: Vec<f64> = rows.iter().map(|r| r.as_ref()[i]).collect();
            linear_slope(counts, &column)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Trace, CUTBACK_FIT_ORDER};

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1500.0 + 0.5 * i as f64).collect()
    }

    fn affine_family(counts: &[u32], a: f64, b: f64) -> TraceFamily {
        let wl = axis(121);
        let traces = counts
            .iter()
            .map(|&c| Trace::new(wl.clone(), vec![a - b * c as f64; wl.len()]).unwrap())
            .collect();
        TraceFamily::new(traces, counts.to_vec()).unwrap()
    }

    #[test]
    fn affine_family_recovers_slope_everywhere() {
        let family = affine_family(&[0, 10, 20, 40], -6.0, 0.15);
        let out = cutback(&family, 1530.0, CUTBACK_FIT_ORDER).unwrap();

        assert!((out.loss_at_wavelength + 0.15).abs() < 1e-9);
        assert_eq!(out.loss_vs_wavelength.len(), 121);
        for (s, r) in out.loss_vs_wavelength.iter().zip(&out.loss_vs_wavelength_raw) {
            assert!((s + 0.15).abs() < 1e-9, "{s}");
            assert!((r + 0.15).abs() < 1e-9, "{r}");
        }
    }

    #[test]
    fn wavelength_dependent_loss_is_resolved() {
        // Per-unit loss grows linearly with wavelength; coupling loss is curved.
        let wl = axis(121);
        let counts = [5u32, 15, 25];
        let traces = counts
            .iter()
            .map(|&c| {
                let p = wl
                    .iter()
                    .map(|&w| -4.0 - 1e-3 * (w - 1530.0).powi(2) - (0.1 + 1e-3 * (w - 1500.0)) * c as f64)
                    .collect();
                Trace::new(wl.clone(), p).unwrap()
            })
            .collect();
        let family = TraceFamily::new(traces, counts.to_vec()).unwrap();

        let out = cutback(&family, 1550.0, CUTBACK_FIT_ORDER).unwrap();
        assert!((out.loss_at_wavelength + 0.15).abs() < 1e-6, "{}", out.loss_at_wavelength);
        assert!((out.loss_vs_wavelength_raw[0] + 0.1).abs() < 1e-9);
    }

    #[test]
    fn missing_wavelength_is_not_found() {
        let family = affine_family(&[1, 2, 3], 0.0, 1.0);
        let err = cutback(&family, 1530.25, CUTBACK_FIT_ORDER).unwrap_err();
        assert_eq!(err, AnalysisError::WavelengthNotFound { wavelength: 1530.25 });
    }

    #[test]
    fn single_trace_is_insufficient() {
        let family = affine_family(&[3], 0.0, 1.0);
        let err = cutback(&family, 1500.0, CUTBACK_FIT_ORDER).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { context: "cutback family", .. }));
    }

    #[test]
    fn identical_counts_cannot_be_regressed() {
        let family = affine_family(&[4, 4], 0.0, 1.0);
        let err = cutback(&family, 1500.0, CUTBACK_FIT_ORDER).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }
}
