//! Validation utilities for farm submissions and upstream weather readings

use rust_decimal::Decimal;

use crate::models::{FarmProfile, WeatherConditions};
use crate::types::Coordinates;

/// Longest farm name accepted
pub const MAX_FARM_NAME_LEN: usize = 120;

// ============================================================================
// Location Validations
// ============================================================================

/// Validate latitude is within [-90, 90]
pub fn validate_latitude(latitude: f64) -> Result<(), &'static str> {
    if !latitude.is_finite() {
        return Err("Latitude must be a number");
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("Latitude must be between -90 and 90");
    }
    Ok(())
}

/// Validate longitude is within [-180, 180]
pub fn validate_longitude(longitude: f64) -> Result<(), &'static str> {
    if !longitude.is_finite() {
        return Err("Longitude must be a number");
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("Longitude must be between -180 and 180");
    }
    Ok(())
}

/// Validate both halves of a coordinate pair
pub fn validate_coordinates(coordinates: &Coordinates) -> Result<(), &'static str> {
    validate_latitude(coordinates.latitude)?;
    validate_longitude(coordinates.longitude)
}

// ============================================================================
// Farm Profile Validations
// ============================================================================

/// Validate farm name is present and of reasonable length
pub fn validate_farm_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Farm name is required");
    }
    if trimmed.chars().count() > MAX_FARM_NAME_LEN {
        return Err("Farm name must be at most 120 characters");
    }
    Ok(())
}

/// Validate farm area is strictly positive
pub fn validate_area_acres(area: Decimal) -> Result<(), &'static str> {
    if area <= Decimal::ZERO {
        return Err("Farm area must be greater than 0 acres");
    }
    Ok(())
}

/// Validate soil moisture is a percentage
pub fn validate_soil_moisture(moisture: Decimal) -> Result<(), &'static str> {
    if moisture < Decimal::ZERO || moisture > Decimal::from(100) {
        return Err("Soil moisture must be between 0 and 100%");
    }
    Ok(())
}

/// Validate a whole profile before it enters the pipeline.
///
/// Returns the offending field name alongside the message.
pub fn validate_farm_profile(profile: &FarmProfile) -> Result<(), (&'static str, &'static str)> {
    validate_farm_name(&profile.farm_name).map_err(|m| ("farmName", m))?;

    if let Some(area) = profile.area_acres {
        validate_area_acres(area).map_err(|m| ("areaAcres", m))?;
    }
    if let Some(moisture) = profile.soil_moisture_percent {
        validate_soil_moisture(moisture).map_err(|m| ("soilMoisturePercent", m))?;
    }

    match &profile.coordinates {
        Some(coordinates) => validate_coordinates(coordinates).map_err(|m| ("coordinates", m))?,
        None if !profile.has_address() => {
            return Err(("address", "Either an address or coordinates are required"))
        }
        None => {}
    }

    Ok(())
}

// ============================================================================
// Weather Validations
// ============================================================================

/// Sanity-check normalized readings coming back from a weather upstream
pub fn validate_weather_conditions(weather: &WeatherConditions) -> Result<(), &'static str> {
    let values = [
        weather.temperature_c,
        weather.humidity_percent,
        weather.precipitation_mm,
        weather.wind_kph,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err("Weather readings must be numbers");
    }
    if !(-90.0..=60.0).contains(&weather.temperature_c) {
        return Err("Temperature outside plausible range");
    }
    if !(0.0..=100.0).contains(&weather.humidity_percent) {
        return Err("Humidity must be between 0 and 100%");
    }
    if weather.precipitation_mm < 0.0 {
        return Err("Precipitation cannot be negative");
    }
    if weather.wind_kph < 0.0 {
        return Err("Wind speed cannot be negative");
    }
    Ok(())
}
