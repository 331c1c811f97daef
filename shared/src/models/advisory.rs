//! Advisory pipeline result models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::farm::FarmProfile;
use super::water_demand::{WaterDemand, WaterNeedLevel};
use super::weather::WeatherSnapshot;
use crate::types::Coordinates;

/// Stages of one advisory run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    ResolvingLocation,
    FetchingWeather,
    Estimating,
    ComposingAdvice,
    Done,
    /// Reached only when the submission fails validation
    Failed,
}

impl PipelineStage {
    /// The stage that follows on the forward path, `None` once terminal
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Idle => Some(PipelineStage::ResolvingLocation),
            PipelineStage::ResolvingLocation => Some(PipelineStage::FetchingWeather),
            PipelineStage::FetchingWeather => Some(PipelineStage::Estimating),
            PipelineStage::Estimating => Some(PipelineStage::ComposingAdvice),
            PipelineStage::ComposingAdvice => Some(PipelineStage::Done),
            PipelineStage::Done | PipelineStage::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::ResolvingLocation => "resolving_location",
            PipelineStage::FetchingWeather => "fetching_weather",
            PipelineStage::Estimating => "estimating",
            PipelineStage::ComposingAdvice => "composing_advice",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Error codes reported on a result
///
/// Only `ValidationError` stops a run; the others mark degraded stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    GeocodingFailure,
    WeatherUnavailable,
    AdvisoryGenerationFailure,
}

impl ErrorKind {
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ErrorKind::ValidationError)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "VALIDATION_ERROR"),
            ErrorKind::GeocodingFailure => write!(f, "GEOCODING_FAILURE"),
            ErrorKind::WeatherUnavailable => write!(f, "WEATHER_UNAVAILABLE"),
            ErrorKind::AdvisoryGenerationFailure => write!(f, "ADVISORY_GENERATION_FAILURE"),
        }
    }
}

/// Location as resolved by the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
    /// Canonical address; `None` when neither geocoding nor the profile supplied one
    pub address: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Terminal value of one advisory run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryResult {
    pub farm_profile: FarmProfile,
    pub location: ResolvedLocation,
    pub weather: WeatherSnapshot,
    pub estimate: WaterDemand,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_need: Option<WaterNeedLevel>,
    pub advice_text: String,
    pub stage: PipelineStage,
    /// First recoverable error hit during the run
    pub error: Option<ErrorKind>,
    /// Every stage that ran on fallback data, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub degradations: Vec<ErrorKind>,
}

impl AdvisoryResult {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Display lines with "N/A" in place of missing weather readings
    pub fn weather_summary(&self) -> String {
        match self.weather.conditions() {
            Some(c) => format!(
                "Temperature: {:.1}°C, Rainfall: {:.1} mm, Humidity: {:.0}%, Wind: {:.1} km/h",
                c.temperature_c, c.precipitation_mm, c.humidity_percent, c.wind_kph
            ),
            None => "Temperature: N/A, Rainfall: N/A, Humidity: N/A, Wind: N/A".to_string(),
        }
    }
}

/// What the record sink stores for each completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmAdvisoryRecord {
    pub id: Uuid,
    pub farm_profile: FarmProfile,
    pub result: AdvisoryResult,
    /// Assigned by the sink, never by the caller
    pub created_at: DateTime<Utc>,
}
