//! Shared types and models for the Wildfire Risk service
//!
//! This crate contains types shared between the backend, the browser
//! helpers (via WASM), and other components of the system.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
