//! Location service configuration.

use std::time::Duration;

/// Tuning parameters for the location service.
///
/// The gate thresholds trade freshness against reverse-geocoding and
/// storage cost: the published position may lag real movement by up to
/// `update_interval` or `significant_distance_km`, whichever binds first.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationConfig {
    /// Minimum time between accepted passive updates; also the freshness
    /// window for a cached position at startup.
    pub update_interval: Duration,

    /// Passive readings closer than this (km) to the current position are
    /// ignored.
    pub significant_distance_km: f64,

    /// Hard deadline for a manual refresh.
    pub refresh_timeout: Duration,
}

impl LocationConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        update_interval: Duration,
        significant_distance_km: f64,
        refresh_timeout: Duration,
    ) -> Self {
        Self {
            update_interval,
            significant_distance_km,
            refresh_timeout,
        }
    }

    pub fn with_update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    pub fn with_significant_distance_km(mut self, km: f64) -> Self {
        self.significant_distance_km = km;
        self
    }

    pub fn with_refresh_timeout(mut self, timeout: Duration) -> Self {
        self.refresh_timeout = timeout;
        self
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(30 * 60),
            significant_distance_km: 0.1,
            refresh_timeout: Duration::from_secs(10),
        }
    }
}
