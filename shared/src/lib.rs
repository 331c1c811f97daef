//! Shared types and models for the irrigation advisory platform
//!
//! This crate contains types shared between the backend, the browser build
//! (via WASM), and other components of the system. The water-demand
//! estimator lives here so both sides compute the same numbers.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
