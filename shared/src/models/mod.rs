//! Domain models for the Wildfire Risk service

pub mod features;
pub mod prediction;
pub mod report;

pub use features::*;
pub use prediction::*;
pub use report::*;
