//! Input/output helpers.
//!
//! - CSV sweep ingest + validation (`ingest`)
//! - measurement dataset layouts (`source`)
//! - per-sample CSV exports (`export`)
//! - result JSON read/write (`result`)

pub mod export;
pub mod ingest;
pub mod result;
pub mod source;

pub use export::*;
pub use ingest::*;
pub use result::*;
pub use source::*;
