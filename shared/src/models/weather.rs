//! Weather data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current conditions, always in metric units (°C, %, mm, km/h)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherConditions {
    pub temperature_c: f64,
    pub humidity_percent: f64,
    pub precipitation_mm: f64,
    pub wind_kph: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Weather for one pipeline run, or the explicit marker that none could be had
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherSnapshot {
    Available(WeatherConditions),
    Unavailable,
}

impl WeatherSnapshot {
    pub fn conditions(&self) -> Option<&WeatherConditions> {
        match self {
            WeatherSnapshot::Available(c) => Some(c),
            WeatherSnapshot::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, WeatherSnapshot::Available(_))
    }
}

/// Convert metres per second to kilometres per hour
pub fn mps_to_kph(mps: f64) -> f64 {
    mps * 3.6
}
