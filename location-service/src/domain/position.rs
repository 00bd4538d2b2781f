//! Geographic coordinates and the user's position.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::error::DomainError;
use crate::distance::haversine_km;

/// A validated latitude/longitude pair in decimal degrees.
///
/// Latitude is always within [-90, 90] and longitude within [-180, 180].
/// Non-finite values are rejected, so any `Coordinates` value is valid by
/// construction.
///
/// # Examples
///
/// ```
/// use location_service::domain::Coordinates;
///
/// let sao_paulo = Coordinates::new(-23.5505, -46.6333).unwrap();
/// assert_eq!(sao_paulo.latitude(), -23.5505);
///
/// assert!(Coordinates::new(90.1, 0.0).is_err());
/// assert!(Coordinates::new(0.0, f64::NAN).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Create coordinates, validating both components.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in decimal degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another point, in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// The best-known location of the user.
///
/// A `Position` is immutable: resolving an address or observing a new fix
/// produces a new value rather than modifying an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    coordinates: Coordinates,
    address: Option<String>,
    observed_at: DateTime<Utc>,
}

impl Position {
    /// Create a position without an address.
    pub fn new(coordinates: Coordinates, observed_at: DateTime<Utc>) -> Self {
        Self {
            coordinates,
            address: None,
            observed_at,
        }
    }

    /// Return a copy of this position with the given address attached.
    pub fn with_address(self, address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
            ..self
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude()
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude()
    }

    /// Human-readable address, if one has been resolved.
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// When this position was acquired.
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Time elapsed since the position was acquired.
    ///
    /// Negative if `now` is earlier than the observation (clock skew).
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now.signed_duration_since(self.observed_at)
    }

    /// Whether the position is younger than `max_age` at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        let max_age = TimeDelta::from_std(max_age).unwrap_or(TimeDelta::MAX);
        self.age(now) < max_age
    }

    /// Distance from this position to a point, in kilometres.
    pub fn distance_km(&self, to: &Coordinates) -> f64 {
        self.coordinates.distance_km(to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(mins: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap() + TimeDelta::minutes(mins)
    }

    fn coords(lat: f64, lon: f64) -> Coordinates {
        Coordinates::new(lat, lon).unwrap()
    }

    #[test]
    fn accepts_boundaries() {
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(Coordinates::new(-90.0, -180.0).is_ok());
        assert!(Coordinates::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(
            Coordinates::new(90.5, 0.0),
            Err(DomainError::InvalidLatitude(90.5))
        );
        assert_eq!(
            Coordinates::new(0.0, -181.0),
            Err(DomainError::InvalidLongitude(-181.0))
        );
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinates::new(f64::NEG_INFINITY, 0.0).is_err());
    }

    #[test]
    fn display_is_comma_joined() {
        assert_eq!(coords(-23.5, -46.25).to_string(), "-23.5,-46.25");
    }

    #[test]
    fn with_address_produces_new_value() {
        let original = Position::new(coords(1.0, 2.0), at(0));
        let named = original.clone().with_address("Av. Paulista, 1000");

        assert_eq!(original.address(), None);
        assert_eq!(named.address(), Some("Av. Paulista, 1000"));
        assert_eq!(named.coordinates(), original.coordinates());
        assert_eq!(named.observed_at(), original.observed_at());
    }

    #[test]
    fn freshness_boundary() {
        let position = Position::new(coords(0.0, 0.0), at(0));
        let interval = Duration::from_secs(30 * 60);

        assert!(position.is_fresh(at(29), interval));
        assert!(!position.is_fresh(at(30), interval));
        assert!(!position.is_fresh(at(40), interval));
    }

    #[test]
    fn future_observation_counts_as_fresh() {
        let position = Position::new(coords(0.0, 0.0), at(10));
        assert!(position.is_fresh(at(0), Duration::from_secs(60)));
        assert_eq!(position.age(at(0)), TimeDelta::minutes(-10));
    }
}
