//! Geocoding: coordinates to addresses and back.
//!
//! Reverse lookups are best-effort: the location service treats any
//! failure as "address unavailable" and keeps the coordinates. Forward
//! lookups back the manual address entry path.

mod cache;
mod client;
mod error;
mod mock;
mod types;

use std::future::Future;

use crate::domain::Coordinates;

pub use cache::{CachedGeocoder, GeocodeCacheConfig};
pub use client::{GeocodingClient, GeocodingConfig};
pub use error::GeocodingError;
pub use mock::MockGeocoder;
pub use types::{GeocodeResponse, GeocodedAddress};

/// An address lookup service.
pub trait Geocoder: Send + Sync + 'static {
    /// Resolve coordinates to a human-readable address.
    fn reverse(
        &self,
        coordinates: Coordinates,
    ) -> impl Future<Output = Result<String, GeocodingError>> + Send;

    /// Resolve a free-text address to coordinates.
    fn forward(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<GeocodedAddress, GeocodingError>> + Send;
}

impl Geocoder for GeocodingClient {
    async fn reverse(&self, coordinates: Coordinates) -> Result<String, GeocodingError> {
        self.reverse_geocode(coordinates).await
    }

    async fn forward(&self, query: &str) -> Result<GeocodedAddress, GeocodingError> {
        self.forward_geocode(query).await
    }
}
