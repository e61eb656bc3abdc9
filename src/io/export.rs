//! Export per-sample results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::path::Path;

use crate::domain::AnalysisOutput;
use crate::error::AppError;

/// Write the per-sample table for an analysis result.
///
/// - corrections: `wavelength,power,fit,corrected`
/// - cutback: `wavelength,loss_fit_db_per_unit,loss_raw_db_per_unit`
/// - bandwidth: `wavelength,power,in_band`
pub fn write_results_csv(path: &Path, output: &AnalysisOutput) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut writer = csv::Writer::from_writer(file);

    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write export CSV row: {e}"));

    match output {
        AnalysisOutput::Correction { trace, result, .. } => {
            writer
                .write_record(["wavelength", "power", "fit", "corrected"])
                .map_err(write_err)?;
            for i in 0..trace.len() {
                writer
                    .write_record([
                        fmt_f64(trace.wavelength[i]),
                        fmt_f64(trace.power[i]),
                        fmt_f64(result.fit_curve[i]),
                        fmt_f64(result.corrected_power[i]),
                    ])
                    .map_err(write_err)?;
            }
        }
        AnalysisOutput::Cutback { wavelength, profile, .. } => {
            writer
                .write_record(["wavelength", "loss_fit_db_per_unit", "loss_raw_db_per_unit"])
                .map_err(write_err)?;
            for (i, &w) in wavelength.iter().enumerate() {
                writer
                    .write_record([
                        fmt_f64(w),
                        fmt_f64(profile.loss_vs_wavelength[i]),
                        fmt_f64(profile.loss_vs_wavelength_raw[i]),
                    ])
                    .map_err(write_err)?;
            }
        }
        AnalysisOutput::Bandwidth { trace, threshold, .. } => {
            let peak = trace.power.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            writer
                .write_record(["wavelength", "power", "in_band"])
                .map_err(write_err)?;
            for (&w, &p) in trace.wavelength.iter().zip(&trace.power) {
                let in_band = p > peak - threshold;
                writer
                    .write_record([fmt_f64(w), fmt_f64(p), in_band.to_string()])
                    .map_err(write_err)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

fn fmt_f64(v: f64) -> String {
    format!("{v:.10}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CorrectionResult, InsertionLossProfile, Trace};

    #[test]
    fn correction_table_has_one_row_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let output = AnalysisOutput::Correction {
            trace: Trace::new(vec![1550.0, 1551.0], vec![-3.0, -4.0]).unwrap(),
            result: CorrectionResult {
                corrected_power: vec![0.5, -0.5],
                fit_curve: vec![-3.5, -3.5],
            },
            envelope: Vec::new(),
            bandwidth: None,
        };

        write_results_csv(&path, &output).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "wavelength,power,fit,corrected");
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("1551.0000000000,-4.0000000000"));
    }

    #[test]
    fn cutback_table_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("loss.csv");
        let output = AnalysisOutput::Cutback {
            wavelength: vec![1550.0],
            counts: vec![1, 2],
            target_wavelength: 1550.0,
            profile: InsertionLossProfile {
                loss_at_wavelength: -0.2,
                loss_vs_wavelength: vec![-0.2],
                loss_vs_wavelength_raw: vec![-0.25],
            },
        };

        write_results_csv(&path, &output).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("wavelength,loss_fit_db_per_unit,loss_raw_db_per_unit\n"));
        assert!(text.contains("-0.2500000000"));
    }
}
