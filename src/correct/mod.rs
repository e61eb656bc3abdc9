//! Trace corrections.
//!
//! Each routine returns a `CorrectionResult`: the corrected power plus the
//! trend that was subtracted (for plotting and exports).

pub mod baseline;
pub mod calibrate;
pub mod envelope;

pub use baseline::baseline_correction;
pub use calibrate::calibrate;
pub use envelope::{calibrate_envelope, envelope_points};
