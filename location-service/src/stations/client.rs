//! Backend station API client.

use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Coordinates, FuelType, Station};

use super::error::StationError;

/// One row of the backend `stations` table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StationDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub gasoline_price: Option<f64>,
    #[serde(default)]
    pub additive_gasoline_price: Option<f64>,
    #[serde(default)]
    pub ethanol_price: Option<f64>,
    #[serde(default)]
    pub diesel_price: Option<f64>,
    #[serde(default)]
    pub diesel_s10_price: Option<f64>,
    #[serde(default)]
    pub gnv_price: Option<f64>,
    #[serde(default)]
    pub prices_updated_at: Option<DateTime<Utc>>,
}

impl StationDto {
    /// Convert to a domain station.
    ///
    /// Returns `None` for rows without valid coordinates, since such a
    /// station can never be ranked or shown on a map.
    pub fn into_station(self) -> Option<Station> {
        let coordinates = Coordinates::new(self.latitude?, self.longitude?).ok()?;

        let prices = [
            (FuelType::Gasoline, self.gasoline_price),
            (FuelType::AdditiveGasoline, self.additive_gasoline_price),
            (FuelType::Ethanol, self.ethanol_price),
            (FuelType::Diesel, self.diesel_price),
            (FuelType::DieselS10, self.diesel_s10_price),
            (FuelType::Gnv, self.gnv_price),
        ]
        .into_iter()
        .filter_map(|(fuel, price)| price.filter(|p| p.is_finite() && *p > 0.0).map(|p| (fuel, p)))
        .collect();

        Some(Station {
            id: self.id,
            name: self.name,
            address: self.address.filter(|a| !a.trim().is_empty()),
            coordinates,
            prices,
            prices_updated_at: self.prices_updated_at,
        })
    }
}

/// Configuration for the backend station client.
#[derive(Clone)]
pub struct StationClientConfig {
    /// Base URL of the backend, without the `/rest/v1` suffix
    pub base_url: String,
    /// Anonymous API key, sent as `apikey` and as a bearer token
    pub api_key: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StationClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl StationClientConfig {
    /// Create a new config for the given backend.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Read-only client for the backend station list.
#[derive(Debug, Clone)]
pub struct StationClient {
    http: reqwest::Client,
    base_url: String,
}

impl StationClient {
    /// Create a new station client.
    pub fn new(config: StationClientConfig) -> Result<Self, StationError> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| StationError::Config("invalid API key format".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| StationError::Config("invalid API key format".to_string()))?;
        headers.insert(HeaderName::from_static("apikey"), api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch every station row.
    pub async fn fetch_all(&self) -> Result<Vec<StationDto>, StationError> {
        let url = format!("{}/rest/v1/stations", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("select", "*")])
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(StationError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StationError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let rows: Vec<StationDto> = serde_json::from_str(&body).map_err(|e| StationError::Json {
            message: e.to_string(),
        })?;

        debug!(count = rows.len(), "fetched station rows");
        Ok(rows)
    }

    /// Fetch every station with usable coordinates.
    pub async fn fetch_stations(&self) -> Result<Vec<Station>, StationError> {
        Ok(into_stations(self.fetch_all().await?))
    }
}

/// Convert rows, dropping those without valid coordinates.
pub(crate) fn into_stations(rows: Vec<StationDto>) -> Vec<Station> {
    let total = rows.len();
    let stations: Vec<Station> = rows.into_iter().filter_map(StationDto::into_station).collect();
    if stations.len() < total {
        warn!(
            skipped = total - stations.len(),
            "skipped stations without valid coordinates"
        );
    }
    stations
}
