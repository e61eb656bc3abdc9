//! Polynomial least-squares fitting over a mean-centered axis.
//!
//! Wavelength axes sit far from zero (~1550 nm, or ~1.55e-6 m), so raw
//! Vandermonde columns for an order-8 fit span dozens of orders of magnitude.
//! Two things keep the fits well conditioned:
//!
//! - callers fit against `x - mean(x)` (`fit_centered` / `evaluate_centered`)
//! - each Vandermonde column is scaled to unit norm before the SVD solve and
//!   the coefficients are rescaled afterwards
//!
//! Centering is always relative to the slice passed in. Evaluating a fit on a
//! different axis than it was fitted on is allowed (the envelope calibrator
//! does exactly that), but each axis is then centered on its own mean.

use nalgebra::{DMatrix, DVector};

use crate::domain::PolynomialFit;
use crate::error::AnalysisError;
use crate::math::solve_least_squares;

/// Arithmetic mean; `0.0` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `x - mean(x)`.
pub fn center(x: &[f64]) -> Vec<f64> {
    let m = mean(x);
    x.iter().map(|v| v - m).collect()
}

/// Least-squares fit of `y` against `x` (uncentered).
pub fn polyfit(x: &[f64], y: &[f64], order: usize) -> Result<PolynomialFit, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: x.len(),
            got: y.len(),
            context: "polynomial fit",
        });
    }

    let n = x.len();
    let p = order + 1;
    if n <= order {
        return Err(AnalysisError::InsufficientData {
            needed: p,
            got: n,
            context: "polynomial fit",
        });
    }

    let mut design = DMatrix::<f64>::zeros(n, p);
    for (i, &xi) in x.iter().enumerate() {
        let mut v = 1.0;
        for j in 0..p {
            design[(i, j)] = v;
            v *= xi;
        }
    }

    let scales: Vec<f64> = (0..p)
        .map(|j| {
            let norm = design.column(j).norm();
            if norm.is_finite() && norm > 0.0 { norm } else { 1.0 }
        })
        .collect();
    for (j, &s) in scales.iter().enumerate() {
        design.column_mut(j).scale_mut(1.0 / s);
    }

    let rhs = DVector::from_column_slice(y);
    let beta = solve_least_squares(&design, &rhs).ok_or(AnalysisError::SingularFit { order })?;

    let coefficients = beta.iter().zip(&scales).map(|(b, s)| b / s).collect();
    Ok(PolynomialFit { coefficients, order })
}

/// Evaluate a polynomial at each `x` (Horner).
pub fn polyval(fit: &PolynomialFit, x: &[f64]) -> Vec<f64> {
    x.iter()
        .map(|&xi| fit.coefficients.iter().rev().fold(0.0, |acc, &c| acc * xi + c))
        .collect()
}

/// Fit `y` against `x - mean(x)`.
pub fn fit_centered(x: &[f64], y: &[f64], order: usize) -> Result<PolynomialFit, AnalysisError> {
    polyfit(&center(x), y, order)
}

/// Evaluate `fit` at `x - mean(x)`.
pub fn evaluate_centered(fit: &PolynomialFit, x: &[f64]) -> Vec<f64> {
    polyval(fit, &center(x))
}

/// Fit and evaluate on the same centered axis; the usual "trend" of a trace.
pub fn trend(x: &[f64], y: &[f64], order: usize) -> Result<Vec<f64>, AnalysisError> {
    let fit = fit_centered(x, y, order)?;
    Ok(evaluate_centered(&fit, x))
}

/// Slope of the degree-1 least-squares line through `(x, y)`.
pub fn linear_slope(x: &[f64], y: &[f64]) -> Result<f64, AnalysisError> {
    if x.len() != y.len() {
        return Err(AnalysisError::ShapeMismatch {
            expected: x.len(),
            got: y.len(),
            context: "linear regression",
        });
    }
    if x.len() < 2 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: x.len(),
            context: "linear regression",
        });
    }

    let xm = mean(x);
    let ym = mean(y);
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - xm;
        sxx += dx * dx;
        sxy += dx * (yi - ym);
    }

    if sxx <= 0.0 {
        return Err(AnalysisError::InsufficientData {
            needed: 2,
            got: 1,
            context: "linear regression (distinct x values)",
        });
    }

    Ok(sxy / sxx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * b.abs().max(1.0)
    }

    fn axis(start: f64, stop: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| start + (stop - start) * i as f64 / (n as f64 - 1.0))
            .collect()
    }

    #[test]
    fn cubic_round_trips_through_order_eight() {
        let x = axis(1500.0, 1600.0, 201);
        let m = mean(&x);
        let y: Vec<f64> = x
            .iter()
            .map(|&v| {
                let u = v - m;
                -3.0 + 0.02 * u - 1e-3 * u * u + 2e-6 * u * u * u
            })
            .collect();

        let fitted = trend(&x, &y, 8).unwrap();
        for (a, b) in fitted.iter().zip(&y) {
            assert!(close(*a, *b, 1e-9), "{a} vs {b}");
        }
    }

    #[test]
    fn meter_scale_axis_round_trips() {
        let x = axis(1.5e-6, 1.6e-6, 301);
        let m = mean(&x);
        let y: Vec<f64> = x
            .iter()
            .map(|&v| {
                let u = (v - m) * 1e7;
                -10.0 - 2.0 * u * u + 0.5 * u.powi(4)
            })
            .collect();

        let fitted = trend(&x, &y, 4).unwrap();
        for (a, b) in fitted.iter().zip(&y) {
            assert!(close(*a, *b, 1e-9), "{a} vs {b}");
        }
    }

    #[test]
    fn exact_line_coefficients() {
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [1.0, 3.0, 5.0, 7.0];
        let fit = polyfit(&x, &y, 1).unwrap();
        assert_eq!(fit.coefficients.len(), 2);
        assert!(close(fit.coefficients[0], 1.0, 1e-12));
        assert!(close(fit.coefficients[1], 2.0, 1e-12));
        assert_eq!(polyval(&fit, &[10.0]), vec![fit.coefficients[0] + 10.0 * fit.coefficients[1]]);
    }

    #[test]
    fn too_few_points_is_insufficient() {
        let err = polyfit(&[1.0, 2.0, 3.0], &[0.0, 0.0, 0.0], 3).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { needed: 4, got: 3, .. }));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = polyfit(&[1.0, 2.0, 3.0], &[0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, AnalysisError::ShapeMismatch { .. }));
    }

    #[test]
    fn evaluation_recenters_on_its_own_axis() {
        // A line fitted on [0, 10] and evaluated on [100, 110] sees the same
        // centered coordinates, so it returns the same values.
        let x: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 2.0 * v).collect();
        let fit = fit_centered(&x, &y, 1).unwrap();
        let shifted: Vec<f64> = x.iter().map(|v| v + 100.0).collect();
        let a = evaluate_centered(&fit, &x);
        let b = evaluate_centered(&fit, &shifted);
        for (u, v) in a.iter().zip(&b) {
            assert!(close(*u, *v, 1e-12));
        }
    }

    #[test]
    fn slope_matches_closed_form() {
        let x = [1.0, 2.0, 4.0, 8.0];
        let y: Vec<f64> = x.iter().map(|v| 5.0 - 0.25 * v).collect();
        assert!(close(linear_slope(&x, &y).unwrap(), -0.25, 1e-12));
    }

    #[test]
    fn slope_needs_distinct_x() {
        let err = linear_slope(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }
}
