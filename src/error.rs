//! Error types.
//!
//! - `AnalysisError`: precondition failures raised by the calibration and
//!   extraction routines. These carry enough structure for callers to match on.
//! - `AppError`: what the binary reports (message + process exit code).
//!
//! Exit codes:
//! - 2: usage or input-file problems
//! - 3: the data cannot be analysed (any `AnalysisError`)
//! - 4: internal/terminal failures

/// Which side of a pass-band scan ran off the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandEdge {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Fewer samples (or accepted envelope points) than the fit requires.
    InsufficientData {
        needed: usize,
        got: usize,
        context: &'static str,
    },
    /// Exact wavelength lookup failed.
    WavelengthNotFound { wavelength: f64 },
    /// The edge scan reached the end of the trace while still in band.
    BandOutOfRange { edge: BandEdge },
    /// Two sequences that must line up do not.
    ShapeMismatch {
        expected: usize,
        got: usize,
        context: &'static str,
    },
    /// The least-squares solve produced non-finite coefficients.
    SingularFit { order: usize },
    InvalidParameter(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InsufficientData { needed, got, context } => {
                write!(f, "Insufficient data for {context}: need at least {needed} points, got {got}.")
            }
            AnalysisError::WavelengthNotFound { wavelength } => {
                write!(f, "Wavelength {wavelength} is not on the sampled axis.")
            }
            AnalysisError::BandOutOfRange { edge } => {
                let side = match edge {
                    BandEdge::Left => "left",
                    BandEdge::Right => "right",
                };
                write!(f, "Pass-band {side} edge runs past the end of the trace.")
            }
            AnalysisError::ShapeMismatch { expected, got, context } if expected == got => {
                write!(f, "Shape mismatch in {context}: sample values differ.")
            }
            AnalysisError::ShapeMismatch { expected, got, context } => {
                write!(f, "Shape mismatch in {context}: expected length {expected}, got {got}.")
            }
            AnalysisError::SingularFit { order } => {
                write!(f, "Polynomial fit of order {order} is numerically singular.")
            }
            AnalysisError::InvalidParameter(message) => write!(f, "Invalid parameter: {message}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_errors_map_to_exit_code_three() {
        let err: AppError = AnalysisError::WavelengthNotFound { wavelength: 1550.0 }.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("1550"));
    }

    #[test]
    fn equal_length_mismatch_reports_differing_values() {
        let msg = AnalysisError::ShapeMismatch {
            expected: 4,
            got: 4,
            context: "cutback wavelength axis",
        }
        .to_string();
        assert_eq!(msg, "Shape mismatch in cutback wavelength axis: sample values differ.");
    }

    #[test]
    fn band_edge_is_named_in_message() {
        let msg = AnalysisError::BandOutOfRange { edge: BandEdge::Right }.to_string();
        assert!(msg.contains("right"), "{msg}");
    }
}
