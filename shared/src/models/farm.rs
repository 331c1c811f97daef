//! Farm registration models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Coordinates;

/// A farm as submitted for an irrigation advisory
///
/// Immutable once handed to the pipeline; the resolved address and
/// coordinates are reported separately on the result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmProfile {
    pub farm_name: String,
    #[serde(default)]
    pub crop_type: CropType,
    /// Farm area in acres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_acres: Option<Decimal>,
    /// Measured soil moisture, 0-100%
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture_percent: Option<Decimal>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl FarmProfile {
    pub fn new(farm_name: impl Into<String>, crop_type: CropType) -> Self {
        Self {
            farm_name: farm_name.into(),
            crop_type,
            area_acres: None,
            soil_moisture_percent: None,
            address: String::new(),
            coordinates: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn with_area_acres(mut self, area: Decimal) -> Self {
        self.area_acres = Some(area);
        self
    }

    pub fn with_soil_moisture(mut self, percent: Decimal) -> Self {
        self.soil_moisture_percent = Some(percent);
        self
    }

    pub fn has_address(&self) -> bool {
        !self.address.trim().is_empty()
    }
}

/// Crops with a known water-use coefficient
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CropType {
    Corn,
    Wheat,
    Soybean,
    #[default]
    Default,
    /// Any other crop name, kept verbatim
    Other(String),
}

impl CropType {
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "corn" | "maize" => CropType::Corn,
            "wheat" => CropType::Wheat,
            "soybean" | "soybeans" | "soy" => CropType::Soybean,
            "" | "default" => CropType::Default,
            _ => CropType::Other(trimmed.to_string()),
        }
    }
}

impl std::fmt::Display for CropType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CropType::Corn => write!(f, "Corn"),
            CropType::Wheat => write!(f, "Wheat"),
            CropType::Soybean => write!(f, "Soybean"),
            CropType::Default => write!(f, "Default"),
            CropType::Other(name) => write!(f, "{}", name),
        }
    }
}

impl From<String> for CropType {
    fn from(s: String) -> Self {
        CropType::parse(&s)
    }
}

impl From<&str> for CropType {
    fn from(s: &str) -> Self {
        CropType::parse(s)
    }
}

impl From<CropType> for String {
    fn from(c: CropType) -> Self {
        c.to_string()
    }
}
