//! HTTP request handlers

pub mod health;
pub mod maps;
pub mod reports;
pub mod risk;

pub use health::*;
pub use maps::*;
pub use reports::*;
pub use risk::*;
