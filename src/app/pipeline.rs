//! Shared analysis pipeline used by the CLI, the demo and the TUI.
//!
//! Front-ends load or synthesize traces; everything after that (core call,
//! optional bandwidth chaining, result assembly) happens here so the
//! presentation layers only deal with `RunOutput`.

use std::path::PathBuf;

use crate::correct::{baseline_correction, calibrate, calibrate_envelope, envelope_points};
use crate::data::{bragg_sweep, cutback_family, passband_sweep, reference_sweep, ring_sweep};
use crate::domain::{
    AnalysisOutput, BASELINE_FIT_ORDER, CALIBRATION_FIT_ORDER, CUTBACK_FIT_ORDER, CorrectionResult,
    DEFAULT_BANDWIDTH_THRESHOLD, EnvelopeConfig, Operation, SampleConfig, Trace, TraceFamily,
};
use crate::error::AppError;
use crate::extract::{bandwidth, cutback, find_nearest};
use crate::io::ingest::IngestedTrace;

/// Unit counts of the synthetic cutback family.
const SAMPLE_COUNTS: [u32; 4] = [0, 5, 10, 20];
/// Per-unit loss (dB) of the synthetic cutback family.
const SAMPLE_LOSS_PER_UNIT: f64 = 0.15;
const SAMPLE_PASSBAND_CENTER_NM: f64 = 1550.0;
const SAMPLE_PASSBAND_WIDTH_NM: f64 = 20.0;

/// All computed outputs of a single analysis run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub operation: Operation,
    pub inputs: Vec<IngestedTrace>,
    pub output: AnalysisOutput,
}

impl RunOutput {
    /// `path#channel` for every input, in order.
    pub fn input_labels(&self) -> Vec<String> {
        self.inputs
            .iter()
            .map(|i| format!("{}#{}", i.source.display(), i.channel))
            .collect()
    }
}

pub fn run_baseline(
    input: IngestedTrace,
    fit_order: usize,
    bandwidth_threshold: Option<f64>,
) -> Result<RunOutput, AppError> {
    log::debug!("baseline correction: order {fit_order}, {} samples", input.trace.len());
    let result = baseline_correction(&input.trace, fit_order)?;
    let output = correction_output(&input.trace, result, Vec::new(), bandwidth_threshold)?;
    Ok(RunOutput {
        operation: Operation::Baseline,
        inputs: vec![input],
        output,
    })
}

pub fn run_calibrate(
    input: IngestedTrace,
    reference: IngestedTrace,
    fit_order: usize,
    bandwidth_threshold: Option<f64>,
) -> Result<RunOutput, AppError> {
    log::debug!("reference calibration: order {fit_order}");
    let result = calibrate(&input.trace, &reference.trace, fit_order)?;
    let output = correction_output(&input.trace, result, Vec::new(), bandwidth_threshold)?;
    Ok(RunOutput {
        operation: Operation::Calibrate,
        inputs: vec![input, reference],
        output,
    })
}

pub fn run_envelope(
    input: IngestedTrace,
    reference: IngestedTrace,
    config: &EnvelopeConfig,
    bandwidth_threshold: Option<f64>,
) -> Result<RunOutput, AppError> {
    log::debug!(
        "envelope calibration: {} segments, tolerance {} dB, order {}",
        config.segments,
        config.difference_tol,
        config.fit_order
    );
    let envelope = envelope_points(&reference.trace, config)?;
    log::info!("envelope scan accepted {} reference samples", envelope.len());

    let result = calibrate_envelope(&input.trace, &reference.trace, config)?;
    let output = correction_output(&input.trace, result, envelope, bandwidth_threshold)?;
    Ok(RunOutput {
        operation: Operation::Envelope,
        inputs: vec![input, reference],
        output,
    })
}

/// Run a cutback extraction; `inputs[i]` was measured with `counts[i]` units.
pub fn run_cutback(
    inputs: Vec<IngestedTrace>,
    counts: Vec<u32>,
    wavelength: f64,
    fit_order: usize,
) -> Result<RunOutput, AppError> {
    if inputs.len() != counts.len() {
        return Err(AppError::new(
            2,
            format!("Got {} traces but {} unit counts.", inputs.len(), counts.len()),
        ));
    }
    let traces: Vec<Trace> = inputs.iter().map(|i| i.trace.clone()).collect();
    let family = TraceFamily::new(traces, counts)?;

    log::debug!("cutback: {} traces, order {fit_order}", family.traces.len());
    let profile = cutback(&family, wavelength, fit_order)?;

    Ok(RunOutput {
        operation: Operation::Cutback,
        inputs,
        output: AnalysisOutput::Cutback {
            wavelength: family.wavelength().to_vec(),
            counts: family.counts,
            target_wavelength: wavelength,
            profile,
        },
    })
}

pub fn run_bandwidth(input: IngestedTrace, threshold: f64) -> Result<RunOutput, AppError> {
    log::debug!("bandwidth: {threshold} dB below peak");
    let result = bandwidth(&input.trace, threshold)?;
    let output = AnalysisOutput::Bandwidth {
        trace: input.trace.clone(),
        threshold,
        result,
    };
    Ok(RunOutput {
        operation: Operation::Bandwidth,
        inputs: vec![input],
        output,
    })
}

/// Run `operation` on synthetic sweeps with library-default parameters.
pub fn run_sample(operation: Operation, config: &SampleConfig) -> Result<RunOutput, AppError> {
    match operation {
        Operation::Baseline => run_baseline(sample_input("ring", ring_sweep(config)?)?, BASELINE_FIT_ORDER, None),
        Operation::Calibrate => run_calibrate(
            sample_input("ring", ring_sweep(config)?)?,
            sample_input("reference", reference_sweep(config)?)?,
            CALIBRATION_FIT_ORDER,
            None,
        ),
        Operation::Envelope => {
            let bragg = bragg_sweep(config)?;
            run_envelope(
                sample_input("bragg", bragg.clone())?,
                sample_input("bragg", bragg)?,
                &EnvelopeConfig::default(),
                None,
            )
        }
        Operation::Cutback => {
            let family = cutback_family(config, &SAMPLE_COUNTS, SAMPLE_LOSS_PER_UNIT)?;
            let axis = family.wavelength().to_vec();
            let target = find_nearest(&axis, SAMPLE_PASSBAND_CENTER_NM)
                .map(|i| axis[i])
                .ok_or_else(|| AppError::new(4, "Empty synthetic wavelength axis."))?;

            let inputs = family
                .traces
                .into_iter()
                .zip(SAMPLE_COUNTS)
                .map(|(trace, count)| sample_input(&format!("cutback-{count}"), trace))
                .collect::<Result<Vec<_>, _>>()?;
            run_cutback(inputs, SAMPLE_COUNTS.to_vec(), target, CUTBACK_FIT_ORDER)
        }
        Operation::Bandwidth => run_bandwidth(
            sample_input(
                "passband",
                passband_sweep(config, SAMPLE_PASSBAND_CENTER_NM, SAMPLE_PASSBAND_WIDTH_NM)?,
            )?,
            DEFAULT_BANDWIDTH_THRESHOLD,
        ),
    }
}

fn sample_input(name: &str, trace: Trace) -> Result<IngestedTrace, AppError> {
    IngestedTrace::from_trace(trace, PathBuf::from(format!("sample:{name}")), "power".to_string())
}

fn correction_output(
    trace: &Trace,
    result: CorrectionResult,
    envelope: Vec<crate::domain::EnvelopePoint>,
    bandwidth_threshold: Option<f64>,
) -> Result<AnalysisOutput, AppError> {
    let bandwidth = match bandwidth_threshold {
        Some(threshold) => {
            let corrected = trace.with_power(result.corrected_power.clone())?;
            Some(bandwidth(&corrected, threshold)?)
        }
        None => None,
    };
    Ok(AnalysisOutput::Correction {
        trace: trace.clone(),
        result,
        envelope,
        bandwidth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> SampleConfig {
        SampleConfig {
            noise_db: 0.0,
            ..SampleConfig::default()
        }
    }

    #[test]
    fn every_operation_runs_on_sample_data() {
        let config = SampleConfig::default();
        for op in Operation::ALL {
            let run = run_sample(op, &config).unwrap();
            assert_eq!(run.operation, op);
            assert!(!run.inputs.is_empty());
        }
    }

    #[test]
    fn sample_cutback_recovers_unit_loss() {
        let run = run_sample(Operation::Cutback, &quiet()).unwrap();
        let AnalysisOutput::Cutback { profile, counts, .. } = &run.output else {
            panic!("expected cutback output");
        };
        assert_eq!(*counts, SAMPLE_COUNTS.to_vec());
        assert!((profile.loss_at_wavelength + SAMPLE_LOSS_PER_UNIT).abs() < 1e-6);
        assert_eq!(run.input_labels()[0], "sample:cutback-0#power");
    }

    #[test]
    fn sample_bandwidth_matches_generated_width() {
        let run = run_sample(Operation::Bandwidth, &quiet()).unwrap();
        let AnalysisOutput::Bandwidth { result, .. } = run.output else {
            panic!("expected bandwidth output");
        };
        // Edges are the first out-of-band samples: at most one step wider per side.
        let dx = 100.0 / 800.0;
        assert!(result.bandwidth >= SAMPLE_PASSBAND_WIDTH_NM);
        assert!(result.bandwidth <= SAMPLE_PASSBAND_WIDTH_NM + 2.0 * dx + 1e-9);
        assert!((result.central_wavelength - SAMPLE_PASSBAND_CENTER_NM).abs() <= dx);
    }

    #[test]
    fn envelope_run_reports_scan_points() {
        let run = run_sample(Operation::Envelope, &quiet()).unwrap();
        let AnalysisOutput::Correction { envelope, .. } = run.output else {
            panic!("expected correction output");
        };
        assert!(envelope.len() > EnvelopeConfig::default().fit_order);
    }

    #[test]
    fn bandwidth_chains_onto_corrected_trace() {
        let trace = passband_sweep(&quiet(), 1550.0, 20.0).unwrap();
        let run = run_baseline(sample_input("passband", trace).unwrap(), 0, Some(3.0)).unwrap();
        let AnalysisOutput::Correction { bandwidth, .. } = run.output else {
            panic!("expected correction output");
        };
        let bw = bandwidth.unwrap();
        assert!((bw.bandwidth - 20.0).abs() < 0.5);
    }

    #[test]
    fn cutback_count_mismatch_is_usage_error() {
        let family = cutback_family(&quiet(), &[0, 1], 0.1).unwrap();
        let inputs = family
            .traces
            .into_iter()
            .map(|t| sample_input("x", t).unwrap())
            .collect();
        let err = run_cutback(inputs, vec![0], 1500.0, 2).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn analysis_failures_map_to_data_exit_code() {
        let trace = Trace::new(vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]).unwrap();
        let err = run_bandwidth(sample_input("falling", trace).unwrap(), 3.0).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
