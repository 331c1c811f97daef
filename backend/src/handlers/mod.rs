//! HTTP handlers

pub mod advisory;
pub mod health;

pub use advisory::*;
pub use health::*;
