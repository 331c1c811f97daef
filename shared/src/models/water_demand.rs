//! Crop water-demand estimation
//!
//! Deterministic, no I/O. Reference evapotranspiration (ET0) follows a
//! simplified Penman-style formula:
//!
//! `ET0 = 0.0023 * (T+17) * sqrt(T+17) * (Rs/(T+273)) * (1 - H/100) * (1 + 0.1*W)`
//!
//! with a fixed solar-radiation proxy `Rs`. Crop-adjusted ETc is `ET0 * Kc`
//! and the water-demand index scales ETc linearly onto 0-100.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::farm::CropType;
use super::weather::{WeatherConditions, WeatherSnapshot};

/// Assumed daily sunlight hours
pub const DEFAULT_SUNLIGHT_HOURS: f64 = 7.0;

/// Solar-radiation proxy in MJ/m²/day derived from sunlight hours
pub const DEFAULT_SOLAR_RADIATION: f64 = DEFAULT_SUNLIGHT_HOURS * 0.5;

/// ETc mapped to an index of 100 (mm/day)
pub const MAX_REFERENCE_ET: f64 = 10.0;

/// Coefficient applied to crops without a table entry
pub const DEFAULT_CROP_COEFFICIENT: f64 = 1.0;

/// Below this temperature `sqrt(T+17)` is undefined or zero
pub const MIN_TEMPERATURE_C: f64 = -17.0;

/// Rejected estimator inputs
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("{field} is not a finite number")]
    NotFinite { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },

    #[error("humidity must be between 0 and 100% (got {0})")]
    HumidityOutOfRange(f64),

    #[error("temperature must be above -17°C (got {0})")]
    TemperatureOutOfRange(f64),
}

/// Crop-adjusted water demand for one set of conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterDemandEstimate {
    #[serde(rename = "referenceET")]
    pub reference_et: f64,
    pub crop_coefficient: f64,
    pub etc: f64,
    /// 0-100
    pub index: u8,
}

/// Estimator outcome; `InsufficientData` when there is no weather to work from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WaterDemand {
    Estimated(WaterDemandEstimate),
    InsufficientData,
}

impl WaterDemand {
    pub fn estimate(&self) -> Option<&WaterDemandEstimate> {
        match self {
            WaterDemand::Estimated(e) => Some(e),
            WaterDemand::InsufficientData => None,
        }
    }
}

/// Coarse reading of the index shown next to the gauge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterNeedLevel {
    Low,
    Moderate,
    High,
}

impl WaterNeedLevel {
    pub fn from_index(index: u8) -> Self {
        if index < 33 {
            WaterNeedLevel::Low
        } else if index > 66 {
            WaterNeedLevel::High
        } else {
            WaterNeedLevel::Moderate
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            WaterNeedLevel::Low => "Doesn't need much water now.",
            WaterNeedLevel::Moderate => "Water need is moderate.",
            WaterNeedLevel::High => "Needs more water!",
        }
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<(), EstimateError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(EstimateError::NotFinite { field })
    }
}

fn check_non_negative(field: &'static str, value: f64) -> Result<(), EstimateError> {
    check_finite(field, value)?;
    if value < 0.0 {
        return Err(EstimateError::Negative { field, value });
    }
    Ok(())
}

/// Reference evapotranspiration (mm/day) from weather alone
pub fn reference_et(weather: &WeatherConditions) -> Result<f64, EstimateError> {
    reference_et_from(
        weather.temperature_c,
        weather.humidity_percent,
        weather.wind_kph,
    )
}

/// ET0 from raw readings: temperature °C, humidity %, wind km/h.
///
/// Temperature must be above [`MIN_TEMPERATURE_C`]; sub-zero readings
/// above -17 °C are accepted. Humidity must lie in 0-100 and wind must not
/// be negative.
pub fn reference_et_from(
    temperature_c: f64,
    humidity_percent: f64,
    wind_kph: f64,
) -> Result<f64, EstimateError> {
    check_finite("temperature", temperature_c)?;
    check_finite("humidity", humidity_percent)?;
    check_non_negative("wind speed", wind_kph)?;

    if temperature_c <= MIN_TEMPERATURE_C {
        return Err(EstimateError::TemperatureOutOfRange(temperature_c));
    }
    if !(0.0..=100.0).contains(&humidity_percent) {
        return Err(EstimateError::HumidityOutOfRange(humidity_percent));
    }

    let t = temperature_c + 17.0;
    let et0 = 0.0023
        * t
        * t.sqrt()
        * (DEFAULT_SOLAR_RADIATION / (temperature_c + 273.0))
        * (1.0 - humidity_percent / 100.0)
        * (1.0 + 0.1 * wind_kph);

    Ok(et0.max(0.0))
}

/// Kc for a crop; unknown crops fall back to [`DEFAULT_CROP_COEFFICIENT`]
pub fn crop_coefficient(crop: &CropType) -> f64 {
    match crop {
        CropType::Corn => 1.2,
        CropType::Wheat => 1.15,
        CropType::Soybean => 1.15,
        CropType::Default | CropType::Other(_) => DEFAULT_CROP_COEFFICIENT,
    }
}

/// Crop-adjusted evapotranspiration, `ET0 * Kc`
pub fn etc(weather: &WeatherConditions, crop: &CropType) -> Result<f64, EstimateError> {
    check_non_negative("precipitation", weather.precipitation_mm)?;
    Ok(reference_et(weather)? * crop_coefficient(crop))
}

/// Scale ETc onto 0-100 against [`MAX_REFERENCE_ET`], clamped at both ends.
///
/// NaN maps to 0.
pub fn normalize_index(etc: f64) -> u8 {
    if !etc.is_finite() {
        return if etc == f64::INFINITY { 100 } else { 0 };
    }
    let scaled = (etc / MAX_REFERENCE_ET * 100.0).round();
    scaled.clamp(0.0, 100.0) as u8
}

/// Full estimate for one snapshot. Unavailable weather yields `InsufficientData`.
pub fn estimate(weather: &WeatherSnapshot, crop: &CropType) -> Result<WaterDemand, EstimateError> {
    let conditions = match weather {
        WeatherSnapshot::Available(c) => c,
        WeatherSnapshot::Unavailable => return Ok(WaterDemand::InsufficientData),
    };

    let reference_et = reference_et(conditions)?;
    let crop_coefficient = crop_coefficient(crop);
    let etc = etc(conditions, crop)?;

    Ok(WaterDemand::Estimated(WaterDemandEstimate {
        reference_et,
        crop_coefficient,
        etc,
        index: normalize_index(etc),
    }))
}
