//! External API integrations
//!
//! Each upstream sits behind a trait so the services can be driven by
//! in-process fakes in tests.

use async_trait::async_trait;
use shared::{Coordinates, WeatherConditions, WeatherLocator};

use crate::error::AppResult;

pub mod advisory;
pub mod geocoding;
pub mod weather;

pub use advisory::GeminiClient;
pub use geocoding::{GeocodeCandidate, NominatimClient};
pub use weather::{OpenWeatherMapClient, WeatherApiClient};

/// Forward and reverse geocoding
#[async_trait]
pub trait GeocodingApi: Send + Sync {
    /// Display name for a point, `None` when the service has no candidate
    async fn reverse(&self, coordinates: Coordinates) -> AppResult<Option<String>>;

    /// Free-text search; an empty list means no match
    async fn search(&self, query: &str) -> AppResult<Vec<GeocodeCandidate>>;
}

/// Current weather conditions, already normalized to metric units
#[async_trait]
pub trait WeatherApi: Send + Sync {
    async fn current(&self, locator: &WeatherLocator) -> AppResult<WeatherConditions>;
}

/// Prompt in, prose out
#[async_trait]
pub trait TextGenerationApi: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}
