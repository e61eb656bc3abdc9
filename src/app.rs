//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - loads sweep files
//! - runs the requested correction or extraction
//! - prints reports/plots
//! - writes optional exports

use std::path::Path;

use clap::Parser;

use crate::cli::{
    BandwidthArgs, BaselineArgs, CalibrateArgs, Command, CutbackArgs, DemoArgs, EnvelopeArgs, PlotArgs,
};
use crate::domain::{Operation, OutputOptions};
use crate::error::AppError;
use crate::io::ingest::{IngestedTrace, load_trace, parse_counts};
use crate::report::{format_result_file, format_run_summary};

pub mod pipeline;

use pipeline::RunOutput;

/// Entry point for the `sweep` binary.
pub fn run() -> Result<(), AppError> {
    // Optional `.env` with SWEEP_* / RUST_LOG overrides.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::cli::init_logging(cli.verbose);

    match cli.command {
        Command::Baseline(args) => handle_baseline(args),
        Command::Calibrate(args) => handle_calibrate(args),
        Command::Envelope(args) => handle_envelope(args),
        Command::Cutback(args) => handle_cutback(args),
        Command::Bandwidth(args) => handle_bandwidth(args),
        Command::Demo(args) => handle_demo(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => crate::tui::run(args),
    }
}

fn handle_baseline(args: BaselineArgs) -> Result<(), AppError> {
    let input = load_trace(&args.input.input, args.input.port)?;
    let run = pipeline::run_baseline(input, args.order, args.bandwidth)?;
    present(&run, &args.output.to_options())
}

fn handle_calibrate(args: CalibrateArgs) -> Result<(), AppError> {
    let input = load_trace(&args.input.input, args.input.port)?;
    let reference = load_trace(&args.reference.reference, args.reference.reference_port)?;
    let run = pipeline::run_calibrate(input, reference, args.order, args.bandwidth)?;
    present(&run, &args.output.to_options())
}

fn handle_envelope(args: EnvelopeArgs) -> Result<(), AppError> {
    let input = load_trace(&args.input.input, args.input.port)?;
    let reference = load_trace(&args.reference.reference, args.reference.reference_port)?;
    let run = pipeline::run_envelope(input, reference, &args.envelope_config(), args.bandwidth)?;
    present(&run, &args.output.to_options())
}

fn handle_cutback(args: CutbackArgs) -> Result<(), AppError> {
    let counts = parse_counts(&args.counts)?;
    let inputs = args
        .inputs
        .iter()
        .map(|p| load_trace(p, args.port))
        .collect::<Result<Vec<IngestedTrace>, _>>()?;
    let run = pipeline::run_cutback(inputs, counts, args.wavelength, args.order)?;
    present(&run, &args.output.to_options())
}

fn handle_bandwidth(args: BandwidthArgs) -> Result<(), AppError> {
    let input = load_trace(&args.input.input, args.input.port)?;
    let run = pipeline::run_bandwidth(input, args.threshold)?;
    present(&run, &args.output.to_options())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = args.sample.sample_config();
    let options = OutputOptions {
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        ..OutputOptions::default()
    };

    let operations: Vec<Operation> = match args.operation {
        Some(op) => vec![op],
        None => Operation::ALL.to_vec(),
    };
    for op in operations {
        let run = pipeline::run_sample(op, &config)?;
        present(&run, &options)?;
    }
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::result::read_result_json(&args.result)?;
    println!("{}", format_result_file(&file));
    println!(
        "{}",
        crate::plot::render_output_plot(&file.output, args.width, args.height)
    );
    Ok(())
}

/// Print the summary (and plot), then write the requested exports.
fn present(run: &RunOutput, options: &OutputOptions) -> Result<(), AppError> {
    println!("{}", format_run_summary(run.operation, &run.inputs, &run.output));

    if options.plot {
        let plot = crate::plot::render_output_plot(&run.output, options.plot_width, options.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &options.export_csv {
        crate::io::export::write_results_csv(path, &run.output)?;
        log_export("CSV", path);
    }
    if let Some(path) = &options.export_json {
        let file = crate::io::result::build_result_file(run.operation, run.input_labels(), run.output.clone());
        crate::io::result::write_result_json(path, &file)?;
        log_export("result JSON", path);
    }

    Ok(())
}

fn log_export(what: &str, path: &Path) {
    log::info!("wrote {what} to '{}'", path.display());
}

/// Rewrite argv so a bare `sweep` opens the TUI.
///
/// Rules:
/// - `sweep`          -> `sweep tui`
/// - anything else    -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    if argv.len() <= 1 {
        argv.push("tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(args(&["sweep"])), args(&["sweep", "tui"]));
        assert_eq!(
            rewrite_args(args(&["sweep", "bandwidth", "a.csv"])),
            args(&["sweep", "bandwidth", "a.csv"])
        );
    }

    #[test]
    fn present_writes_both_exports() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");
        let json_path = dir.path().join("out.json");

        let config = crate::domain::SampleConfig {
            points: 201,
            ..crate::domain::SampleConfig::default()
        };
        let run = pipeline::run_sample(Operation::Bandwidth, &config).unwrap();
        let options = OutputOptions {
            plot: false,
            export_csv: Some(csv_path.clone()),
            export_json: Some(json_path.clone()),
            ..OutputOptions::default()
        };
        present(&run, &options).unwrap();

        let back = crate::io::result::read_result_json(&json_path).unwrap();
        assert_eq!(back.operation, Operation::Bandwidth);
        match (&back.output, &run.output) {
            (
                crate::domain::AnalysisOutput::Bandwidth { result: a, .. },
                crate::domain::AnalysisOutput::Bandwidth { result: b, .. },
            ) => assert!((a.bandwidth - b.bandwidth).abs() < 1e-9),
            other => panic!("unexpected outputs: {other:?}"),
        }
        assert_eq!(back.inputs, vec!["sample:passband#power".to_string()]);

        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(csv_text.lines().count(), 1 + 201);
    }
}
