//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the correction/extraction code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{AnalysisOutput, InsertionLossProfile, Operation, ResultFile};
use crate::io::ingest::IngestedTrace;
use crate::report::{summarize, table_indices};

/// Rows in the cutback loss table.
const LOSS_TABLE_ROWS: usize = 9;

/// One line per input: provenance, sample range and skipped rows.
pub fn format_ingest_summary(ingested: &IngestedTrace) -> String {
    let s = &ingested.stats;
    let mut out = format!(
        "{} [{}]: n={} | wavelength=[{:.3}, {:.3}] | power=[{:.2}, {:.2}]dB",
        ingested.source.display(),
        ingested.channel,
        s.n_points,
        s.wavelength_min,
        s.wavelength_max,
        s.power_min,
        s.power_max,
    );
    if !ingested.row_errors.is_empty() {
        out.push_str(&format!(
            " | skipped {} of {} rows",
            ingested.row_errors.len(),
            ingested.rows_read
        ));
    }
    out
}

/// Full run summary: operation header, inputs, then the output metrics.
pub fn format_run_summary(operation: Operation, inputs: &[IngestedTrace], output: &AnalysisOutput) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== sweep - {} ===\n", operation.display_name()));
    out.push_str("Inputs:\n");
    for i in inputs {
        out.push_str(&format!("- {}\n", format_ingest_summary(i)));
    }
    out.push('\n');
    out.push_str(&format_output(output));

    out
}

/// Summary of a saved result document.
pub fn format_result_file(file: &ResultFile) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== {} - {} ===\n", file.tool, file.operation.display_name()));
    out.push_str(&format!("Generated: {}\n", file.generated.to_rfc3339()));
    out.push_str("Inputs:\n");
    for i in &file.inputs {
        out.push_str(&format!("- {i}\n"));
    }
    out.push('\n');
    out.push_str(&format_output(&file.output));

    out
}

/// Metrics of one analysis output.
pub fn format_output(output: &AnalysisOutput) -> String {
    let mut out = String::new();

    match output {
        AnalysisOutput::Correction {
            trace,
            result,
            envelope,
            bandwidth,
        } => {
            if let Some(s) = summarize(&result.fit_curve) {
                out.push_str(&format!("Fit curve: [{:.3}, {:.3}]dB\n", s.min, s.max));
            }
            if let Some(s) = summarize(&result.corrected_power) {
                out.push_str(&format!(
                    "Corrected: [{:.3}, {:.3}]dB | mean={:.3}dB | spread={:.3}dB\n",
                    s.min, s.max, s.mean, s.spread
                ));
            }
            if !envelope.is_empty() {
                out.push_str(&format!(
                    "Envelope: {} reference samples kept of {}\n",
                    envelope.len(),
                    trace.len()
                ));
            }
            if let Some(bw) = bandwidth {
                out.push_str(&format!(
                    "Bandwidth: {:.4} nm around {:.4} nm\n",
                    bw.bandwidth, bw.central_wavelength
                ));
            }
        }
        AnalysisOutput::Cutback {
            wavelength,
            counts,
            target_wavelength,
            profile,
        } => {
            let counts: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
            out.push_str(&format!("Unit counts: {}\n", counts.join(", ")));
            out.push_str(&format!(
                "Loss at {target_wavelength:.4} nm: {:.4} dB/unit\n",
                profile.loss_at_wavelength
            ));
            if let Some(s) = summarize(&profile.loss_vs_wavelength) {
                out.push_str(&format!(
                    "Loss across band (fit): [{:.4}, {:.4}] | mean={:.4} dB/unit\n",
                    s.min, s.max, s.mean
                ));
            }
            out.push('\n');
            out.push_str(&format_loss_table(wavelength, profile));
        }
        AnalysisOutput::Bandwidth {
            threshold, result, ..
        } => {
            out.push_str(&format!("Threshold: {threshold:.2} dB below peak\n"));
            out.push_str(&format!("Bandwidth: {:.4} nm\n", result.bandwidth));
            out.push_str(&format!("Center: {:.4} nm\n", result.central_wavelength));
        }
    }

    out
}

fn format_loss_table(wavelength: &[f64], profile: &InsertionLossProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>12} {:>14} {:>14}\n", "wavelength", "loss_fit", "loss_raw"));
    out.push_str(&format!("{:-<12} {:-<14} {:-<14}\n", "", "", ""));

    for i in table_indices(wavelength.len(), LOSS_TABLE_ROWS) {
        out.push_str(&format!(
            "{:>12.4} {:>14.5} {:>14.5}\n",
            wavelength[i], profile.loss_vs_wavelength[i], profile.loss_vs_wavelength_raw[i]
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::domain::{BandwidthResult, CorrectionResult, Trace};
    use crate::io::ingest::RowError;

    fn ingested() -> IngestedTrace {
        let trace = Trace::new(vec![1550.0, 1551.0, 1552.0], vec![-3.0, -1.0, -2.0]).unwrap();
        IngestedTrace::from_trace(trace, PathBuf::from("dut.csv"), "power".to_string()).unwrap()
    }

    #[test]
    fn ingest_summary_mentions_skipped_rows() {
        let mut i = ingested();
        assert_eq!(
            format_ingest_summary(&i),
            "dut.csv [power]: n=3 | wavelength=[1550.000, 1552.000] | power=[-3.00, -1.00]dB"
        );

        i.rows_read = 4;
        i.row_errors.push(RowError {
            line: 3,
            message: "bad".to_string(),
        });
        assert!(format_ingest_summary(&i).ends_with("| skipped 1 of 4 rows"));
    }

    #[test]
    fn correction_summary_lists_bandwidth() {
        let i = ingested();
        let output = AnalysisOutput::Correction {
            trace: i.trace.clone(),
            result: CorrectionResult {
                corrected_power: vec![-2.0, 0.0, -1.0],
                fit_curve: vec![-1.0, -1.0, -1.0],
            },
            envelope: Vec::new(),
            bandwidth: Some(BandwidthResult {
                bandwidth: 2.0,
                central_wavelength: 1551.0,
            }),
        };
        let txt = format_run_summary(Operation::Baseline, &[i], &output);
        assert!(txt.starts_with("=== sweep - baseline correction ===\n"));
        assert!(txt.contains("Corrected: [-2.000, 0.000]dB | mean=-1.000dB"));
        assert!(txt.contains("Bandwidth: 2.0000 nm around 1551.0000 nm"));
        assert!(!txt.contains("Envelope:"));
    }

    #[test]
    fn cutback_table_has_header_and_rows() {
        let wavelength: Vec<f64> = (0..5).map(|i| 1540.0 + i as f64 * 5.0).collect();
        let output = AnalysisOutput::Cutback {
            wavelength: wavelength.clone(),
            counts: vec![0, 5, 10],
            target_wavelength: 1550.0,
            profile: InsertionLossProfile {
                loss_at_wavelength: -0.2,
                loss_vs_wavelength: vec![-0.2; 5],
                loss_vs_wavelength_raw: vec![-0.21; 5],
            },
        };
        let txt = format_output(&output);
        assert!(txt.contains("Unit counts: 0, 5, 10\n"));
        assert!(txt.contains("Loss at 1550.0000 nm: -0.2000 dB/unit"));
        // header + rule + one row per sample
        let table_lines = txt.lines().skip_while(|l| !l.contains("loss_fit")).count();
        assert_eq!(table_lines, 2 + 5);
    }
}
