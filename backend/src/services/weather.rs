//! Weather service for current conditions
//!
//! Wraps the configured upstream with a TTL cache keyed by coordinate
//! bucket or normalized address. Callers always get a snapshot back;
//! anything that goes wrong becomes `WeatherSnapshot::Unavailable`.

use std::sync::Arc;
use std::time::Duration;

use shared::{
    normalize_address, validate_coordinates, validate_weather_conditions, CoordinateBucket,
    WeatherConditions, WeatherLocator, WeatherSnapshot,
};

use super::cache::TtlCache;
use super::retry::RetryPolicy;
use crate::error::{AppError, AppResult};
use crate::external::WeatherApi;

/// Cache key for a weather lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum WeatherKey {
    Bucket(CoordinateBucket),
    Address(String),
}

/// Weather service shared by all pipeline runs
pub struct WeatherProvider {
    api: Arc<dyn WeatherApi>,
    cache: TtlCache<WeatherKey, WeatherConditions>,
    retry: RetryPolicy,
}

impl WeatherProvider {
    pub fn new(api: Arc<dyn WeatherApi>, cache_ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            api,
            cache: TtlCache::new(cache_ttl),
            retry,
        }
    }

    /// Current conditions at `locator`, or `Unavailable`
    pub async fn current_weather(&self, locator: &WeatherLocator) -> WeatherSnapshot {
        match self.fetch_conditions(locator).await {
            Ok(conditions) => WeatherSnapshot::Available(conditions),
            Err(e) => {
                tracing::warn!(%locator, "Weather unavailable: {}", e);
                WeatherSnapshot::Unavailable
            }
        }
    }

    /// Same lookup as [`Self::current_weather`] but with the failure reason kept
    pub async fn fetch_conditions(&self, locator: &WeatherLocator) -> AppResult<WeatherConditions> {
        let key = match locator {
            WeatherLocator::Coordinates(c) => {
                validate_coordinates(c).map_err(|m| AppError::validation("coordinates", m))?;
                WeatherKey::Bucket(c.bucket())
            }
            WeatherLocator::Address(address) => {
                let normalized = normalize_address(address);
                if normalized.is_empty() {
                    return Err(AppError::validation("address", "Address is empty"));
                }
                WeatherKey::Address(normalized)
            }
        };

        if let Some(conditions) = self.cache.get(&key).await {
            tracing::debug!(?key, "Weather cache hit");
            return Ok(conditions);
        }

        tracing::debug!(?key, "Weather cache miss");
        let api = &self.api;
        let retry = &self.retry;
        self.cache
            .get_or_try_insert_with(key, || async move {
                let conditions = retry
                    .run("weather", move || api.current(locator))
                    .await
                    .map_err(|e| AppError::WeatherUnavailable(e.to_string()))?;

                validate_weather_conditions(&conditions)
                    .map_err(|m| AppError::WeatherUnavailable(m.to_string()))?;

                Ok(conditions)
            })
            .await
    }

    /// Drop expired cache entries
    pub async fn purge_expired(&self) -> usize {
        self.cache.purge_expired().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use shared::Coordinates;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedWeather {
        conditions: WeatherConditions,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherApi for FixedWeather {
        async fn current(&self, _locator: &WeatherLocator) -> AppResult<WeatherConditions> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.conditions.clone())
        }
    }

    fn fixed(humidity: f64) -> Arc<FixedWeather> {
        Arc::new(FixedWeather {
            conditions: WeatherConditions {
                temperature_c: 21.0,
                humidity_percent: humidity,
                precipitation_mm: 0.0,
                wind_kph: 8.0,
                fetched_at: Utc::now(),
            },
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_addresses_share_normalized_key() {
        let api = fixed(40.0);
        let provider = WeatherProvider::new(api.clone(), Duration::from_secs(60), RetryPolicy::none());

        let a = provider
            .current_weather(&WeatherLocator::Address("Ames,  Iowa".to_string()))
            .await;
        let b = provider
            .current_weather(&WeatherLocator::Address(" ames, iowa ".to_string()))
            .await;

        assert!(a.is_available());
        assert_eq!(a, b);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_implausible_payload_is_unavailable() {
        let api = fixed(140.0);
        let provider = WeatherProvider::new(api.clone(), Duration::from_secs(60), RetryPolicy::none());

        let snapshot = provider
            .current_weather(&WeatherLocator::Coordinates(Coordinates::new(10.0, 10.0)))
            .await;

        assert_eq!(snapshot, WeatherSnapshot::Unavailable);
    }

    #[tokio::test]
    async fn test_invalid_locator_skips_upstream() {
        let api = fixed(40.0);
        let provider = WeatherProvider::new(api.clone(), Duration::from_secs(60), RetryPolicy::none());

        let snapshot = provider
            .current_weather(&WeatherLocator::Coordinates(Coordinates::new(100.0, 0.0)))
            .await;
        assert_eq!(snapshot, WeatherSnapshot::Unavailable);

        let snapshot = provider
            .current_weather(&WeatherLocator::Address("  ".to_string()))
            .await;
        assert_eq!(snapshot, WeatherSnapshot::Unavailable);

        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }
}
