//! In-process stand-ins for the upstream services
//!
//! Each mock counts its calls and can be told to answer slowly or fail
//! with a given HTTP status.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use advisory_backend::error::{AppError, AppResult};
use advisory_backend::external::{GeocodeCandidate, GeocodingApi, TextGenerationApi, WeatherApi};
use advisory_backend::services::{
    AdvisoryComposer, AdvisoryPipeline, GeoResolver, RetryPolicy, StageBudgets, WeatherProvider,
};
use async_trait::async_trait;
use chrono::Utc;
use shared::{Coordinates, WeatherConditions, WeatherLocator};

pub fn upstream_error(service: &'static str, status: u16) -> AppError {
    AppError::ExternalService {
        service,
        status: Some(status),
        message: format!("HTTP {}", status),
    }
}

/// Short backoff so retry tests stay fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::single(Duration::from_millis(5))
}

pub fn test_budgets() -> StageBudgets {
    StageBudgets {
        geocode: Duration::from_millis(500),
        weather: Duration::from_millis(500),
        advisory: Duration::from_millis(300),
    }
}

pub fn conditions(temperature_c: f64, humidity_percent: f64, wind_kph: f64) -> WeatherConditions {
    WeatherConditions {
        temperature_c,
        humidity_percent,
        precipitation_mm: 0.0,
        wind_kph,
        fetched_at: Utc::now(),
    }
}

// ============================================================================
// Geocoding
// ============================================================================

pub struct MockGeocoder {
    pub reverse_calls: AtomicUsize,
    pub search_calls: AtomicUsize,
    address: Option<String>,
    candidates: Vec<GeocodeCandidate>,
    fail_status: Option<u16>,
    delay: Duration,
}

impl MockGeocoder {
    pub fn answering(address: &str) -> Self {
        Self {
            reverse_calls: AtomicUsize::new(0),
            search_calls: AtomicUsize::new(0),
            address: Some(address.to_string()),
            candidates: Vec::new(),
            fail_status: None,
            delay: Duration::ZERO,
        }
    }

    pub fn empty() -> Self {
        Self {
            address: None,
            ..Self::answering("")
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::answering("")
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<GeocodeCandidate>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.reverse_calls.load(Ordering::SeqCst) + self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingApi for MockGeocoder {
    async fn reverse(&self, _coordinates: Coordinates) -> AppResult<Option<String>> {
        self.reverse_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.fail_status {
            Some(status) => Err(upstream_error("geocoding", status)),
            None => Ok(self.address.clone()),
        }
    }

    async fn search(&self, _query: &str) -> AppResult<Vec<GeocodeCandidate>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match self.fail_status {
            Some(status) => Err(upstream_error("geocoding", status)),
            None => Ok(self.candidates.clone()),
        }
    }
}

// ============================================================================
// Weather
// ============================================================================

pub struct MockWeather {
    pub calls: AtomicUsize,
    conditions: WeatherConditions,
    fail_status: Option<u16>,
    delay: Duration,
    last_locator: Mutex<Option<WeatherLocator>>,
}

impl MockWeather {
    pub fn answering(conditions: WeatherConditions) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            conditions,
            fail_status: None,
            delay: Duration::ZERO,
            last_locator: Mutex::new(None),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::answering(conditions(20.0, 50.0, 5.0))
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_locator(&self) -> Option<WeatherLocator> {
        self.last_locator.lock().unwrap().clone()
    }
}

#[async_trait]
impl WeatherApi for MockWeather {
    async fn current(&self, locator: &WeatherLocator) -> AppResult<WeatherConditions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_locator.lock().unwrap() = Some(locator.clone());
        tokio::time::sleep(self.delay).await;
        match self.fail_status {
            Some(status) => Err(upstream_error("weather", status)),
            None => Ok(self.conditions.clone()),
        }
    }
}

// ============================================================================
// Text generation
// ============================================================================

pub struct MockGenerator {
    pub calls: AtomicUsize,
    text: String,
    fail_status: Option<u16>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn answering(text: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            text: text.to_string(),
            fail_status: None,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_status: Some(status),
            ..Self::answering("")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationApi for MockGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        tokio::time::sleep(self.delay).await;
        match self.fail_status {
            Some(status) => Err(upstream_error("advisory", status)),
            None => Ok(self.text.clone()),
        }
    }
}

// ============================================================================
// Pipeline assembly
// ============================================================================

pub struct Harness {
    pub geocoder: Arc<MockGeocoder>,
    pub weather: Arc<MockWeather>,
    pub generator: Arc<MockGenerator>,
    pub pipeline: AdvisoryPipeline,
}

pub fn harness(geocoder: MockGeocoder, weather: MockWeather, generator: MockGenerator) -> Harness {
    harness_with_budgets(geocoder, weather, generator, test_budgets())
}

pub fn harness_with_budgets(
    geocoder: MockGeocoder,
    weather: MockWeather,
    generator: MockGenerator,
    budgets: StageBudgets,
) -> Harness {
    let geocoder = Arc::new(geocoder);
    let weather = Arc::new(weather);
    let generator = Arc::new(generator);
    let ttl = Duration::from_secs(600);

    let pipeline = AdvisoryPipeline::new(
        Arc::new(GeoResolver::new(geocoder.clone(), ttl, fast_retry())),
        Arc::new(WeatherProvider::new(weather.clone(), ttl, fast_retry())),
        Arc::new(AdvisoryComposer::new(generator.clone(), fast_retry())),
        budgets,
    );

    Harness {
        geocoder,
        weather,
        generator,
        pipeline,
    }
}
