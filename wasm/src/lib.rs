//! WebAssembly module for the irrigation advisory dashboard
//!
//! Exposes the canonical water-demand estimator to the browser so the UI
//! shows the same numbers the server computes:
//! - Crop evapotranspiration and the 0-100 water-demand index
//! - Crop coefficients and water-need messages
//! - Coordinate checks before a form is submitted

use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

#[cfg(target_arch = "wasm32")]
fn log_rejection(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn log_rejection(_message: &str) {}

fn conditions(temperature_c: f64, humidity_percent: f64, wind_kph: f64) -> WeatherConditions {
    WeatherConditions {
        temperature_c,
        humidity_percent,
        precipitation_mm: 0.0,
        wind_kph,
        fetched_at: Default::default(),
    }
}

fn compute_etc(
    temperature_c: f64,
    humidity_percent: f64,
    wind_kph: f64,
    crop: &str,
) -> Result<f64, String> {
    etc(
        &conditions(temperature_c, humidity_percent, wind_kph),
        &CropType::parse(crop),
    )
    .map_err(|e| e.to_string())
}

fn compute_estimate(weather_json: &str, crop: &str) -> Result<String, String> {
    let snapshot = if weather_json.trim().is_empty() {
        WeatherSnapshot::Unavailable
    } else {
        let weather: WeatherConditions = serde_json::from_str(weather_json)
            .map_err(|e| format!("Invalid weather JSON: {}", e))?;
        WeatherSnapshot::Available(weather)
    };

    let demand = estimate(&snapshot, &CropType::parse(crop)).map_err(|e| e.to_string())?;
    serde_json::to_string(&demand).map_err(|e| e.to_string())
}

/// Crop evapotranspiration (mm/day) for the given readings
#[wasm_bindgen]
pub fn calculate_etc(
    temperature_c: f64,
    humidity_percent: f64,
    wind_kph: f64,
    crop: &str,
) -> Result<f64, JsValue> {
    compute_etc(temperature_c, humidity_percent, wind_kph, crop).map_err(|e| {
        log_rejection(&e);
        JsValue::from_str(&e)
    })
}

/// Scale an ETc value onto the 0-100 index
#[wasm_bindgen]
pub fn normalize_water_index(etc: f64) -> u8 {
    normalize_index(etc)
}

/// Crop coefficient for a crop name; unknown crops get the default
#[wasm_bindgen]
pub fn crop_coefficient_for(crop: &str) -> f64 {
    crop_coefficient(&CropType::parse(crop))
}

/// Short message for an index value
#[wasm_bindgen]
pub fn water_need_message(index: u8) -> String {
    WaterNeedLevel::from_index(index).message().to_string()
}

/// Full estimate as JSON.
///
/// `weather_json` is a `WeatherConditions` object; an empty string means no
/// weather, which yields an `insufficient_data` estimate.
#[wasm_bindgen]
pub fn estimate_water_demand(weather_json: &str, crop: &str) -> Result<String, JsValue> {
    compute_estimate(weather_json, crop).map_err(|e| {
        log_rejection(&e);
        JsValue::from_str(&e)
    })
}

/// Check a coordinate pair before submitting the farm form
#[wasm_bindgen]
pub fn validate_farm_coordinates(latitude: f64, longitude: f64) -> bool {
    validate_coordinates(&Coordinates::new(latitude, longitude)).is_ok()
}
