//! Data transfer objects for web requests and responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FuelType, Position};
use crate::ranking::RankedStation;
use crate::service::LocationError;

/// A position as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionResult {
    pub latitude: f64,
    pub longitude: f64,

    /// Human-readable address, if it could be resolved
    pub address: Option<String>,

    pub observed_at: DateTime<Utc>,
}

impl From<&Position> for PositionResult {
    fn from(p: &Position) -> Self {
        Self {
            latitude: p.latitude(),
            longitude: p.longitude(),
            address: p.address().map(str::to_string),
            observed_at: p.observed_at(),
        }
    }
}

/// Response for `GET /position`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PositionStatusResponse {
    /// Latest known position
    pub position: Option<PositionResult>,

    /// Whether a sensor read or address lookup is in progress
    pub acquiring: bool,

    /// Code of the last acquisition error (e.g. "permission_denied")
    pub last_error: Option<String>,
}

/// Request to set the position manually.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetPositionRequest {
    pub latitude: f64,
    pub longitude: f64,

    /// Address to attach; looked up when absent
    pub address: Option<String>,
}

/// Request to locate a typed address.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddressSearchRequest {
    pub query: String,
}

/// Query for `GET /stations/nearby`.
#[derive(Debug, Default, Deserialize)]
pub struct NearbyStationsRequest {
    /// Only stations within this many kilometres
    pub radius_km: Option<f64>,

    /// Rank by price of this fuel instead of distance
    pub fuel: Option<String>,

    /// Maximum number of stations to return (default 20, max 100)
    pub limit: Option<usize>,
}

/// A station in nearby results.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,

    /// Kilometres from the current position, absent without a position
    pub distance_km: Option<f64>,

    /// Prices by fuel type
    pub prices: BTreeMap<FuelType, f64>,

    pub prices_updated_at: Option<DateTime<Utc>>,
}

impl From<&RankedStation<'_>> for StationResult {
    fn from(r: &RankedStation<'_>) -> Self {
        let s = r.station;
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            address: s.address.clone(),
            latitude: s.coordinates.latitude(),
            longitude: s.coordinates.longitude(),
            distance_km: r.distance_km,
            prices: s.prices.clone(),
            prices_updated_at: s.prices_updated_at,
        }
    }
}

/// Response for `GET /stations/nearby`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NearbyStationsResponse {
    /// Position the distances were measured from
    pub position: Option<PositionResult>,

    pub stations: Vec<StationResult>,
}

/// Response for `POST /stations/refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StationRefreshResponse {
    pub count: usize,
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,

    /// Machine-readable location error code, when one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn from_location(error: LocationError) -> Self {
        Self {
            error: error.to_string(),
            code: Some(error.code().to_string()),
        }
    }
}
