//! Geocoding API response types.
//!
//! Only the fields this crate uses are modelled; everything else in the
//! response is ignored.

use serde::Deserialize;

use crate::domain::Coordinates;

use super::error::GeocodingError;

/// Top-level response for both reverse and forward lookups.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GeocodeResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Result of a forward lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub coordinates: Coordinates,
    pub formatted_address: String,
}

impl GeocodeResponse {
    /// Map the `status` field to an error unless it is `OK`.
    fn check_status(&self) -> Result<(), GeocodingError> {
        let message = self.error_message.clone().unwrap_or_default();
        match self.status.as_str() {
            "OK" => Ok(()),
            "ZERO_RESULTS" => Err(GeocodingError::NoResults),
            "REQUEST_DENIED" => Err(GeocodingError::Unauthorized(message)),
            "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(GeocodingError::RateLimited),
            other => Err(GeocodingError::Status {
                status: other.to_string(),
                message,
            }),
        }
    }

    fn into_first(self) -> Result<GeocodeResult, GeocodingError> {
        self.check_status()?;
        self.results.into_iter().next().ok_or(GeocodingError::NoResults)
    }

    /// Formatted address of the first result (reverse lookup).
    pub fn into_address(self) -> Result<String, GeocodingError> {
        self.into_first()?
            .formatted_address
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| GeocodingError::Malformed("missing formatted_address".to_string()))
    }

    /// Location and formatted address of the first result (forward lookup).
    pub fn into_location(self) -> Result<GeocodedAddress, GeocodingError> {
        let first = self.into_first()?;

        let location = first
            .geometry
            .ok_or_else(|| GeocodingError::Malformed("missing geometry".to_string()))?
            .location;
        let coordinates = Coordinates::new(location.lat, location.lng)
            .map_err(|e| GeocodingError::Malformed(e.to_string()))?;
        let formatted_address = first
            .formatted_address
            .ok_or_else(|| GeocodingError::Malformed("missing formatted_address".to_string()))?;

        Ok(GeocodedAddress {
            coordinates,
            formatted_address,
        })
    }
}
