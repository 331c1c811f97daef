//! Weather API clients for fetching current conditions
//!
//! Two upstream flavours are supported: WeatherAPI (`current.json`) and
//! OpenWeatherMap (`weather`). Both are normalized into
//! [`WeatherConditions`] with metric units and wind in km/h.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use shared::{mps_to_kph, WeatherConditions, WeatherLocator};

use super::WeatherApi;
use crate::error::{AppError, AppResult};

const SERVICE: &str = "weather";

fn build_client(timeout: Duration) -> AppResult<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode the JSON body. HTTP failures become
/// [`AppError::ExternalService`], an undecodable body [`AppError::InvalidPayload`].
async fn fetch_json<T: serde::de::DeserializeOwned>(request: RequestBuilder) -> AppResult<T> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::from_request(SERVICE, e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::ExternalService {
            service: SERVICE,
            status: Some(status.as_u16()),
            message: format!("Weather API error: {} - {}", status, body),
        });
    }

    response.json().await.map_err(|e| AppError::InvalidPayload {
        service: SERVICE,
        message: format!("Failed to parse weather response: {}", e),
    })
}

fn timestamp_or_now(epoch: Option<i64>) -> DateTime<Utc> {
    epoch
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(Utc::now)
}

// ============================================================================
// WeatherAPI (weatherapi.com)
// ============================================================================

/// WeatherAPI client
#[derive(Clone)]
pub struct WeatherApiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    current: WeatherApiCurrent,
}

#[derive(Debug, Deserialize)]
struct WeatherApiCurrent {
    temp_c: f64,
    humidity: f64,
    #[serde(default)]
    precip_mm: f64,
    wind_kph: f64,
    last_updated_epoch: Option<i64>,
}

impl WeatherApiClient {
    /// Create a new client; `base_url` is e.g. `https://api.weatherapi.com/v1`
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn convert_current_response(data: WeatherApiResponse) -> WeatherConditions {
        WeatherConditions {
            temperature_c: data.current.temp_c,
            humidity_percent: data.current.humidity,
            precipitation_mm: data.current.precip_mm,
            wind_kph: data.current.wind_kph,
            fetched_at: timestamp_or_now(data.current.last_updated_epoch),
        }
    }
}

#[async_trait]
impl WeatherApi for WeatherApiClient {
    async fn current(&self, locator: &WeatherLocator) -> AppResult<WeatherConditions> {
        let q = match locator {
            WeatherLocator::Coordinates(c) => format!("{},{}", c.latitude, c.longitude),
            WeatherLocator::Address(address) => address.clone(),
        };

        let request = self
            .client
            .get(format!("{}/current.json", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("q", q.as_str())]);

        let data: WeatherApiResponse = fetch_json(request).await?;
        Ok(Self::convert_current_response(data))
    }
}

impl std::fmt::Debug for WeatherApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// OpenWeatherMap
// ============================================================================

/// OpenWeatherMap client
#[derive(Clone)]
pub struct OpenWeatherMapClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// OpenWeatherMap API response for current weather
#[derive(Debug, Deserialize)]
struct OWMCurrentResponse {
    main: OWMMain,
    wind: OWMWind,
    rain: Option<OWMRain>,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OWMMain {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct OWMWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OWMRain {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
}

impl OpenWeatherMapClient {
    /// Create a new client; `base_url` is e.g. `https://api.openweathermap.org/data/2.5`
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> AppResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Wind arrives in m/s; a missing rain block means no rain
    fn convert_current_response(data: OWMCurrentResponse) -> WeatherConditions {
        WeatherConditions {
            temperature_c: data.main.temp,
            humidity_percent: data.main.humidity,
            precipitation_mm: data.rain.and_then(|r| r.one_hour).unwrap_or(0.0),
            wind_kph: mps_to_kph(data.wind.speed),
            fetched_at: timestamp_or_now(data.dt),
        }
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherMapClient {
    async fn current(&self, locator: &WeatherLocator) -> AppResult<WeatherConditions> {
        let mut query = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        match locator {
            WeatherLocator::Coordinates(c) => {
                query.push(("lat", c.latitude.to_string()));
                query.push(("lon", c.longitude.to_string()));
            }
            WeatherLocator::Address(address) => query.push(("q", address.clone())),
        }

        let request = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&query);

        let data: OWMCurrentResponse = fetch_json(request).await?;
        Ok(Self::convert_current_response(data))
    }
}

impl std::fmt::Debug for OpenWeatherMapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
