//! Geocoding client for a Nominatim-compatible service
//!
//! Reverse lookups turn coordinates into a display name; search turns a
//! typed address into candidate points.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::Coordinates;

use super::GeocodingApi;
use crate::error::{AppError, AppResult};

const SERVICE: &str = "geocoding";

/// Nominatim client
#[derive(Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

/// One match from a forward search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeCandidate {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Nominatim reverse response
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

/// Nominatim search result; coordinates arrive as strings
#[derive(Debug, Deserialize)]
struct SearchResult {
    display_name: String,
    lat: String,
    lon: String,
}

impl NominatimClient {
    /// Create a new client against `base_url`
    pub fn new(base_url: String, user_agent: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::from_request(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService {
                service: SERVICE,
                status: Some(status.as_u16()),
                message: body,
            });
        }

        response.json().await.map_err(|e| AppError::InvalidPayload {
            service: SERVICE,
            message: format!("Failed to parse response: {}", e),
        })
    }
}

#[async_trait]
impl GeocodingApi for NominatimClient {
    async fn reverse(&self, coordinates: Coordinates) -> AppResult<Option<String>> {
        let data: ReverseResponse = self
            .get_json(
                "reverse",
                &[
                    ("lat", coordinates.latitude.to_string()),
                    ("lon", coordinates.longitude.to_string()),
                    ("format", "json".to_string()),
                ],
            )
            .await?;

        Ok(display_name_from(data))
    }

    async fn search(&self, query: &str) -> AppResult<Vec<GeocodeCandidate>> {
        let results: Vec<SearchResult> = self
            .get_json(
                "search",
                &[
                    ("q", query.to_string()),
                    ("format", "json".to_string()),
                    ("limit", "5".to_string()),
                ],
            )
            .await?;

        Ok(candidates_from(results))
    }
}

fn display_name_from(data: ReverseResponse) -> Option<String> {
    if let Some(err) = data.error {
        tracing::debug!("Reverse geocoding returned no result: {}", err);
        return None;
    }
    data.display_name.filter(|name| !name.trim().is_empty())
}

/// Keep only candidates whose coordinates parse and are in range
fn candidates_from(results: Vec<SearchResult>) -> Vec<GeocodeCandidate> {
    results
        .into_iter()
        .filter_map(|r| {
            let lat = r.lat.trim().parse::<f64>().ok()?;
            let lon = r.lon.trim().parse::<f64>().ok()?;
            let coordinates = Coordinates::new(lat, lon);
            coordinates.is_in_range().then(|| GeocodeCandidate {
                address: r.display_name,
                coordinates,
            })
        })
        .collect()
}
