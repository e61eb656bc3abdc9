//! Metric extraction: cutback insertion loss and pass-band width.

pub mod bandwidth;
pub mod cutback;

pub use bandwidth::{bandwidth, find_nearest};
pub use cutback::cutback;
