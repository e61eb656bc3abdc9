//! Read/write result JSON files.
//!
//! A result JSON is the portable record of one analysis run:
//! - operation + input descriptions + generation timestamp
//! - the full output (input trace, fitted trend, corrected power, metrics)
//!
//! The schema is defined by `domain::ResultFile`. `sweep plot` reads it back.

use std::fs::File;
use std::path::Path;

use chrono::Utc;

use crate::domain::{AnalysisOutput, Operation, ResultFile};
use crate::error::AppError;

pub const TOOL_NAME: &str = "sweep";

pub fn build_result_file(operation: Operation, inputs: Vec<String>, output: AnalysisOutput) -> ResultFile {
    ResultFile {
        tool: TOOL_NAME.to_string(),
        generated: Utc::now(),
        operation,
        inputs,
        output,
    }
}

/// Write a result JSON file.
pub fn write_result_json(path: &Path, result: &ResultFile) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create result JSON '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, result)
        .map_err(|e| AppError::new(2, format!("Failed to write result JSON: {e}")))?;

    Ok(())
}

/// Read a result JSON file.
///
/// Array lengths inside the output must agree with its wavelength axis.
pub fn read_result_json(path: &Path) -> Result<ResultFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open result JSON '{}': {e}", path.display())))?;
    let result: ResultFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid result JSON: {e}")))?;
    result
        .output
        .check_shape()
        .map_err(|e| AppError::new(2, format!("Inconsistent result JSON '{}': {e}", path.display())))?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BandwidthResult, InsertionLossProfile, Trace};

    #[test]
    fn result_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("result.json");

        let output = AnalysisOutput::Bandwidth {
            trace: Trace::new(vec![1549.0, 1550.0, 1551.0], vec![-9.0, -1.0, -9.0]).unwrap(),
            threshold: 3.0,
            result: BandwidthResult {
                bandwidth: 2.0,
                central_wavelength: 1550.0,
            },
        };
        let file = build_result_file(Operation::Bandwidth, vec!["a.csv#power".to_string()], output);

        write_result_json(&path, &file).unwrap();
        let back = read_result_json(&path).unwrap();
        assert_eq!(back, file);

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"kind\": \"bandwidth\""));
    }

    #[test]
    fn garbage_is_rejected_with_usage_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(read_result_json(&path).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn ragged_cutback_file_is_rejected_with_usage_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.json");

        let output = AnalysisOutput::Cutback {
            wavelength: vec![1549.0, 1550.0, 1551.0],
            counts: vec![0, 5, 10],
            target_wavelength: 1550.0,
            profile: InsertionLossProfile {
                loss_at_wavelength: -0.2,
                loss_vs_wavelength: vec![-0.2],
                loss_vs_wavelength_raw: vec![-0.21],
            },
        };
        let file = build_result_file(Operation::Cutback, vec!["a.csv#power".to_string()], output);
        write_result_json(&path, &file).unwrap();

        let err = read_result_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("loss vs wavelength"));
    }

    #[test]
    fn ragged_trace_in_file_is_rejected_with_usage_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged_trace.json");
        let good = build_result_file(
            Operation::Bandwidth,
            vec!["a.csv#power".to_string()],
            AnalysisOutput::Bandwidth {
                trace: Trace::new(vec![1549.0, 1550.0], vec![-9.0, -1.0]).unwrap(),
                threshold: 3.0,
                result: BandwidthResult {
                    bandwidth: 1.0,
                    central_wavelength: 1549.5,
                },
            },
        );
        let text = serde_json::to_string(&good)
            .unwrap()
            .replace("\"power\":[-9.0,-1.0]", "\"power\":[-9.0,-1.0,-4.0]");
        assert!(text.contains("-4.0"));
        std::fs::write(&path, text).unwrap();

        assert_eq!(read_result_json(&path).unwrap_err().exit_code(), 2);
    }
}
