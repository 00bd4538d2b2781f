//! HTTP client for the geocoding endpoint.
//!
//! Speaks the Google-style JSON geocoding API: `GET {base}/json` with
//! either `latlng` (reverse) or `address` (forward) plus the API key.

use tracing::debug;

use crate::domain::Coordinates;

use super::error::GeocodingError;
use super::types::{GeocodeResponse, GeocodedAddress};

/// Default base URL for the geocoding API.
const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode";

/// Configuration for the geocoding client.
#[derive(Clone)]
pub struct GeocodingConfig {
    /// API key sent as the `key` query parameter
    pub api_key: String,
    /// Base URL for the API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Preferred result language (e.g. "pt-BR")
    pub language: Option<String>,
}

impl std::fmt::Debug for GeocodingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocodingConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("language", &self.language)
            .finish()
    }
}

impl GeocodingConfig {
    /// Create a new config with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            language: None,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the preferred result language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Client for the geocoding API.
#[derive(Clone)]
pub struct GeocodingClient {
    http: reqwest::Client,
    config: GeocodingConfig,
}

impl GeocodingClient {
    /// Create a new geocoding client.
    pub fn new(config: GeocodingConfig) -> Result<Self, GeocodingError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Resolve coordinates to a formatted address.
    pub async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<String, GeocodingError> {
        debug!(%coordinates, "reverse geocoding");
        self.request(("latlng", coordinates.to_string()))
            .await?
            .into_address()
    }

    /// Resolve a free-text address to coordinates.
    pub async fn forward_geocode(&self, query: &str) -> Result<GeocodedAddress, GeocodingError> {
        debug!(query, "forward geocoding");
        self.request(("address", query.to_string()))
            .await?
            .into_location()
    }

    async fn request(&self, lookup: (&str, String)) -> Result<GeocodeResponse, GeocodingError> {
        let url = format!("{}/json", self.config.base_url.trim_end_matches('/'));

        let mut params = vec![lookup, ("key", self.config.api_key.clone())];
        if let Some(language) = &self.config.language {
            params.push(("language", language.clone()));
        }

        let response = self.http.get(&url).query(&params).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Unauthorized(body));
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodingError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| GeocodingError::Json {
            message: e.to_string(),
        })
    }
}
