//! Domain models for the irrigation advisory pipeline

mod advisory;
mod farm;
mod water_demand;
mod weather;

pub use advisory::*;
pub use farm::*;
pub use water_demand::*;
pub use weather::*;
