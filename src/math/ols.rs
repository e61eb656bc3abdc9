//! Least squares solver.
//!
//! Every fit in this crate reduces to a small dense problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! with a tall design matrix (hundreds to thousands of wavelength samples,
//! at most nine columns).
//!
//! Implementation choices:
//! - SVD rather than QR: nalgebra's `QR::solve` is intended for square systems
//!   and will panic for non-square matrices.
//! - Singular values below `s_max · max(rows, cols) · ε` are truncated, the
//!   same relative cutoff LAPACK-style polynomial fitters use. Rank-deficient
//!   problems therefore get the minimum-norm solution instead of exploding.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the design matrix is empty/zero or the solution is not finite.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    let s_max = svd.singular_values.max();
    if !(s_max.is_finite() && s_max > 0.0) {
        return None;
    }

    let rcond = x.nrows().max(x.ncols()) as f64 * f64::EPSILON;
    let beta = svd.solve(y, s_max * rcond).ok()?;

    beta.iter().all(|v| v.is_finite()).then_some(beta)
}
