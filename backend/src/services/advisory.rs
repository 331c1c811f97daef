//! Irrigation advice composition
//!
//! Builds a prompt from everything the pipeline learned about a farm and
//! asks the text-generation upstream for prose. Advice is best-effort: a
//! failed or empty answer becomes [`FALLBACK_ADVICE`].

use std::fmt::Write as _;
use std::sync::Arc;

use shared::{FarmProfile, ResolvedLocation, WaterDemand, WaterNeedLevel, WeatherSnapshot};

use super::retry::RetryPolicy;
use crate::error::{AppError, AppResult};
use crate::external::TextGenerationApi;

/// Returned whenever the upstream cannot produce advice
pub const FALLBACK_ADVICE: &str = "Unable to generate a recommendation right now.";

const INSTRUCTIONS: &str = "You are an experienced irrigation advisor. \
Give short, practical irrigation advice for the farm below in a few sentences.";

/// Advice composer shared by all pipeline runs
pub struct AdvisoryComposer {
    api: Arc<dyn TextGenerationApi>,
    retry: RetryPolicy,
}

impl AdvisoryComposer {
    pub fn new(api: Arc<dyn TextGenerationApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Advice text for the farm, or [`FALLBACK_ADVICE`]
    pub async fn compose(
        &self,
        profile: &FarmProfile,
        location: &ResolvedLocation,
        weather: &WeatherSnapshot,
        estimate: &WaterDemand,
    ) -> String {
        match self.try_compose(profile, location, weather, estimate).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(farm = %profile.farm_name, "Advice generation failed: {}", e);
                FALLBACK_ADVICE.to_string()
            }
        }
    }

    /// Like [`Self::compose`] but surfaces the failure
    pub async fn try_compose(
        &self,
        profile: &FarmProfile,
        location: &ResolvedLocation,
        weather: &WeatherSnapshot,
        estimate: &WaterDemand,
    ) -> AppResult<String> {
        let prompt = build_prompt(profile, location, weather, estimate);
        let api = &self.api;
        let prompt = prompt.as_str();

        let text = self
            .retry
            .run("advisory", move || api.generate(prompt))
            .await
            .map_err(|e| match e {
                e @ AppError::AdvisoryGenerationFailure(_) => e,
                other => AppError::AdvisoryGenerationFailure(other.to_string()),
            })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(AppError::AdvisoryGenerationFailure(
                "empty response".to_string(),
            ));
        }
        Ok(text.to_string())
    }
}

/// Prompt for the text-generation upstream.
///
/// Sections with no data are left out entirely rather than filled with
/// placeholders.
pub fn build_prompt(
    profile: &FarmProfile,
    location: &ResolvedLocation,
    weather: &WeatherSnapshot,
    estimate: &WaterDemand,
) -> String {
    let mut prompt = String::from(INSTRUCTIONS);
    prompt.push_str("\n\n");

    let _ = writeln!(prompt, "Farm: {}", profile.farm_name.trim());
    let _ = writeln!(prompt, "Crop: {}", profile.crop_type);

    let address = location
        .address
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .or_else(|| Some(profile.address.trim()).filter(|a| !a.is_empty()));
    if let Some(address) = address {
        let _ = writeln!(prompt, "Address: {}", address);
    }

    if let Some(c) = location.coordinates.or(profile.coordinates) {
        let _ = writeln!(prompt, "Coordinates: {:.6}, {:.6}", c.latitude, c.longitude);
    }
    if let Some(area) = profile.area_acres {
        let _ = writeln!(prompt, "Area: {} acres", area);
    }
    if let Some(moisture) = profile.soil_moisture_percent {
        let _ = writeln!(prompt, "Soil moisture: {}%", moisture);
    }

    match weather.conditions() {
        Some(c) => {
            prompt.push_str("\nCurrent weather:\n");
            let _ = writeln!(prompt, "- Temperature: {:.1}°C", c.temperature_c);
            let _ = writeln!(prompt, "- Humidity: {:.0}%", c.humidity_percent);
            let _ = writeln!(prompt, "- Rainfall: {:.1} mm", c.precipitation_mm);
            let _ = writeln!(prompt, "- Wind: {:.1} km/h", c.wind_kph);
        }
        None => {
            prompt.push_str(
                "\nCurrent weather is not known. Base the advice on the crop and location.\n",
            );
        }
    }

    if let Some(e) = estimate.estimate() {
        prompt.push_str("\nWater demand estimate:\n");
        let _ = writeln!(prompt, "- Reference evapotranspiration: {:.3} mm/day", e.reference_et);
        let _ = writeln!(prompt, "- Crop coefficient: {:.2}", e.crop_coefficient);
        let _ = writeln!(prompt, "- Crop evapotranspiration: {:.3} mm/day", e.etc);
        let _ = writeln!(
            prompt,
            "- Water demand index: {}/100 ({})",
            e.index,
            WaterNeedLevel::from_index(e.index).message()
        );
    }

    prompt
}
