//! HTTP handlers for farm advisory submissions

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{AdvisoryResult, Coordinates, CropType, FarmProfile};

use crate::error::{AppError, AppResult};
use crate::AppState;

/// Farm registration form as posted by the dashboard
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmSubmission {
    #[serde(default)]
    pub farm_name: String,
    pub crop_type: Option<String>,
    pub area_acres: Option<Decimal>,
    pub soil_moisture_percent: Option<Decimal>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FarmSubmission {
    /// Convert into a profile; a half-set coordinate pair is rejected here
    pub fn into_profile(self) -> AppResult<FarmProfile> {
        let coordinates = Coordinates::from_parts(self.latitude, self.longitude)
            .map_err(|m| AppError::validation("coordinates", m))?;

        Ok(FarmProfile {
            farm_name: self.farm_name.trim().to_string(),
            crop_type: self
                .crop_type
                .as_deref()
                .map(CropType::parse)
                .unwrap_or_default(),
            area_acres: self.area_acres,
            soil_moisture_percent: self.soil_moisture_percent,
            address: self.address.unwrap_or_default().trim().to_string(),
            coordinates,
        })
    }
}

/// Run the advisory pipeline for a submitted farm
pub async fn submit_farm_advisory(
    State(state): State<AppState>,
    Json(input): Json<FarmSubmission>,
) -> AppResult<Json<AdvisoryResult>> {
    let profile = input.into_profile()?;
    let result = state.pipeline.submit(profile).await?;
    Ok(Json(result))
}
