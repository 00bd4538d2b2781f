//! Runtime configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::geocoding::GeocodingConfig;
use crate::service::LocationConfig;
use crate::stations::StationClientConfig;

/// Default path of the last-known position cache.
const DEFAULT_CACHE_PATH: &str = "location_cache.json";

/// Default listen address of the HTTP surface.
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// Errors reading the configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} is not set")]
    Missing(&'static str),

    /// A variable could not be parsed
    #[error("invalid {var}={value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the daemon needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub geocoding: GeocodingConfig,
    pub stations: StationClientConfig,
    pub location: LocationConfig,
    pub cache_path: PathBuf,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let mut geocoding = GeocodingConfig::new(require("GEOCODING_API_KEY")?);
        if let Some(url) = get("GEOCODING_BASE_URL") {
            geocoding = geocoding.with_base_url(url);
        }

        let stations = StationClientConfig::new(require("BACKEND_URL")?, require("BACKEND_API_KEY")?);

        let mut location = LocationConfig::default();
        if let Some(mins) = parse::<u64>(&get, "LOCATION_UPDATE_INTERVAL_MINS")? {
            let secs = mins.checked_mul(60).ok_or_else(|| ConfigError::Invalid {
                var: "LOCATION_UPDATE_INTERVAL_MINS",
                value: mins.to_string(),
                reason: "interval too large".to_string(),
            })?;
            location = location.with_update_interval(Duration::from_secs(secs));
        }
        if let Some(km) = parse::<f64>(&get, "LOCATION_SIGNIFICANT_DISTANCE_KM")? {
            if !km.is_finite() || km < 0.0 {
                return Err(ConfigError::Invalid {
                    var: "LOCATION_SIGNIFICANT_DISTANCE_KM",
                    value: km.to_string(),
                    reason: "must be a non-negative number".to_string(),
                });
            }
            location = location.with_significant_distance_km(km);
        }
        if let Some(secs) = parse::<u64>(&get, "LOCATION_REFRESH_TIMEOUT_SECS")? {
            location = location.with_refresh_timeout(Duration::from_secs(secs));
        }

        let cache_path = get("LOCATION_CACHE_PATH")
            .unwrap_or_else(|| DEFAULT_CACHE_PATH.to_string())
            .into();

        let listen_addr = get("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "LISTEN_ADDR",
                value: listen_addr.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            geocoding,
            stations,
            location,
            cache_path,
            listen_addr,
        })
    }
}

/// Parse an optional variable.
fn parse<T>(get: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get(var)
        .map(|value| {
            value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("GEOCODING_API_KEY", "geo-key"),
        ("BACKEND_URL", "https://backend.example"),
        ("BACKEND_API_KEY", "anon-key"),
    ];

    fn load(extra: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: Vec<(&str, &str)> = REQUIRED.iter().chain(extra).copied().collect();
        AppConfig::from_lookup(lookup(&vars))
    }

    #[test]
    fn defaults() {
        let config = load(&[]).unwrap();

        assert_eq!(config.geocoding.api_key, "geo-key");
        assert_eq!(config.stations.base_url, "https://backend.example");
        assert_eq!(config.stations.api_key, "anon-key");
        assert_eq!(config.location, LocationConfig::default());
        assert_eq!(config.cache_path, PathBuf::from("location_cache.json"));
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("GEOCODING_BASE_URL", "http://localhost:8081"),
            ("LOCATION_CACHE_PATH", "/var/lib/location/position.json"),
            ("LOCATION_UPDATE_INTERVAL_MINS", "15"),
            ("LOCATION_SIGNIFICANT_DISTANCE_KM", "0.25"),
            ("LOCATION_REFRESH_TIMEOUT_SECS", "5"),
            ("LISTEN_ADDR", "0.0.0.0:8080"),
        ])
        .unwrap();

        assert_eq!(config.geocoding.base_url, "http://localhost:8081");
        assert_eq!(
            config.cache_path,
            PathBuf::from("/var/lib/location/position.json")
        );
        assert_eq!(config.location.update_interval, Duration::from_secs(15 * 60));
        assert_eq!(config.location.significant_distance_km, 0.25);
        assert_eq!(config.location.refresh_timeout, Duration::from_secs(5));
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn missing_required_variable() {
        let vars = lookup(&[("GEOCODING_API_KEY", "k"), ("BACKEND_URL", "http://b")]);
        assert_eq!(
            AppConfig::from_lookup(vars).unwrap_err(),
            ConfigError::Missing("BACKEND_API_KEY")
        );
    }

    #[test]
    fn blank_counts_as_missing() {
        let vars = lookup(&[
            ("GEOCODING_API_KEY", "   "),
            ("BACKEND_URL", "http://b"),
            ("BACKEND_API_KEY", "k"),
        ]);
        assert_eq!(
            AppConfig::from_lookup(vars).unwrap_err(),
            ConfigError::Missing("GEOCODING_API_KEY")
        );
    }

    #[test]
    fn invalid_numbers() {
        let err = load(&[("LOCATION_UPDATE_INTERVAL_MINS", "half an hour")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { var: "LOCATION_UPDATE_INTERVAL_MINS", .. }
        ));

        let err = load(&[("LOCATION_SIGNIFICANT_DISTANCE_KM", "-1")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { var: "LOCATION_SIGNIFICANT_DISTANCE_KM", .. }
        ));
    }

    #[test]
    fn huge_interval_is_rejected() {
        let max = u64::MAX.to_string();
        let err = load(&[("LOCATION_UPDATE_INTERVAL_MINS", max.as_str())]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { var: "LOCATION_UPDATE_INTERVAL_MINS", .. }
        ));
    }

    #[test]
    fn invalid_listen_addr() {
        let err = load(&[("LISTEN_ADDR", "localhost")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "LISTEN_ADDR", .. }));
    }
}
