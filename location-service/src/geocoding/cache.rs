//! Caching layer for geocoding lookups.
//!
//! Reverse geocoding is a paid, rate-limited call. Nearby fixes resolve to
//! the same address, so coordinates are bucketed to a fixed number of
//! decimal places (4 places ≈ 11 m) before being used as a cache key.
//! Only successful lookups are cached.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::Coordinates;

use super::error::GeocodingError;
use super::types::GeocodedAddress;
use super::Geocoder;

/// Cache key for reverse lookups: coordinates scaled and rounded.
type CoordinateKey = (i64, i64);

/// Configuration for the geocoding cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per lookup kind.
    pub max_capacity: u64,

    /// Decimal places kept when bucketing coordinates.
    pub precision: u32,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 10_000,
            precision: 4,
        }
    }
}

/// Geocoder wrapper that caches results.
pub struct CachedGeocoder<G> {
    inner: G,
    reverse: MokaCache<CoordinateKey, String>,
    forward: MokaCache<String, GeocodedAddress>,
    scale: f64,
}

impl<G: Geocoder> CachedGeocoder<G> {
    /// Wrap a geocoder with a cache.
    pub fn new(inner: G, config: &GeocodeCacheConfig) -> Self {
        let reverse = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let forward = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            reverse,
            forward,
            scale: 10f64.powi(config.precision as i32),
        }
    }

    /// Bucket coordinates to the configured precision.
    fn coordinate_key(&self, coordinates: &Coordinates) -> CoordinateKey {
        (
            (coordinates.latitude() * self.scale).round() as i64,
            (coordinates.longitude() * self.scale).round() as i64,
        )
    }

    /// Normalize a free-text query for use as a key.
    fn query_key(query: &str) -> String {
        query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String, GeocodingError> {
        let key = self.coordinate_key(&coordinates);

        if let Some(address) = self.reverse.get(&key).await {
            trace!(%coordinates, "reverse geocode cache hit");
            return Ok(address);
        }

        let address = self.inner.reverse(coordinates).await?;
        self.reverse.insert(key, address.clone()).await;
        Ok(address)
    }

    async fn forward(&self, query: &str) -> Result<GeocodedAddress, GeocodingError> {
        let key = Self::query_key(query);

        if let Some(found) = self.forward.get(&key).await {
            trace!(query, "forward geocode cache hit");
            return Ok(found);
        }

        let found = self.inner.forward(query).await?;
        self.forward.insert(key, found.clone()).await;
        Ok(found)
    }
}
