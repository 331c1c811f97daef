//! Forward and reverse geocoding with a coordinate-bucketed cache

use std::sync::Arc;
use std::time::Duration;

use shared::{normalize_address, validate_coordinates, CoordinateBucket, Coordinates};

use super::cache::TtlCache;
use super::retry::RetryPolicy;
use crate::error::{AppError, AppResult};
use crate::external::{GeocodeCandidate, GeocodingApi};

/// Geocoding service shared by all pipeline runs
pub struct GeoResolver {
    api: Arc<dyn GeocodingApi>,
    addresses: TtlCache<CoordinateBucket, String>,
    searches: TtlCache<String, Vec<GeocodeCandidate>>,
    retry: RetryPolicy,
}

impl GeoResolver {
    pub fn new(api: Arc<dyn GeocodingApi>, cache_ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            api,
            addresses: TtlCache::new(cache_ttl),
            searches: TtlCache::new(cache_ttl),
            retry,
        }
    }

    /// Reverse-geocode `coordinates` into a display address.
    ///
    /// Out-of-range coordinates are rejected before any upstream call. An
    /// upstream error or an empty answer is a `GeocodingFailure`.
    pub async fn resolve_address(&self, coordinates: Coordinates) -> AppResult<String> {
        validate_coordinates(&coordinates).map_err(|m| AppError::validation("coordinates", m))?;

        let bucket = coordinates.bucket();
        if let Some(address) = self.addresses.get(&bucket).await {
            tracing::debug!(%bucket, "Geocode cache hit");
            return Ok(address);
        }

        tracing::debug!(%bucket, "Geocode cache miss");
        let api = &self.api;
        let retry = &self.retry;
        self.addresses
            .get_or_try_insert_with(bucket, || async move {
                match retry.run("geocoding", move || api.reverse(coordinates)).await {
                    Ok(Some(address)) => Ok(address),
                    Ok(None) => Err(AppError::GeocodingFailure(format!(
                        "no address found for {}",
                        coordinates
                    ))),
                    Err(e) => Err(AppError::GeocodingFailure(e.to_string())),
                }
            })
            .await
    }

    /// Search for places matching `query`; no match is an empty list
    pub async fn resolve_coordinates(&self, query: &str) -> AppResult<Vec<GeocodeCandidate>> {
        let key = normalize_address(query);
        if key.is_empty() {
            return Ok(Vec::new());
        }

        let api = &self.api;
        let retry = &self.retry;
        let query = query.trim();
        self.searches
            .get_or_try_insert_with(key, || async move {
                retry
                    .run("geocoding", move || api.search(query))
                    .await
                    .map_err(|e| AppError::GeocodingFailure(e.to_string()))
            })
            .await
    }

    /// Drop expired cache entries
    pub async fn purge_expired(&self) -> usize {
        self.addresses.purge_expired().await + self.searches.purge_expired().await
    }
}
