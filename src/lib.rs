//! `sweep-cal` library crate.
//!
//! Spectral-sweep post-processing for photonic test data: baseline and
//! reference calibration, envelope calibration, cutback insertion loss and
//! pass-band bandwidth.
//!
//! The binary (`sweep`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the numeric core (`math`, `correct`, `extract`) stays free of I/O

pub mod app;
pub mod cli;
pub mod correct;
pub mod data;
pub mod domain;
pub mod error;
pub mod extract;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
