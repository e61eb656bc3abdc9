//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - measurement inputs (`Trace`, `TraceFamily`)
//! - analysis outputs (`CorrectionResult`, `InsertionLossProfile`, `BandwidthResult`)
//! - tuning/config types (`EnvelopeConfig`, `OutputOptions`, `SampleConfig`)

pub mod types;

pub use types::*;
