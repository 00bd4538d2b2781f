//! Location service error taxonomy.

use crate::geocoding::GeocodingError;
use crate::sensor::SensorError;

/// Errors surfaced by the location service.
///
/// Sensor and geocoding errors are converted to one of these kinds at the
/// service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum LocationError {
    /// Sensor access refused; ends the passive watch for the session
    #[error("location permission denied")]
    PermissionDenied,

    /// The sensor could not resolve a fix; a later reading may succeed
    #[error("position unavailable")]
    PositionUnavailable,

    /// A one-shot read exceeded its deadline
    #[error("timed out waiting for a position fix")]
    Timeout,

    /// Address lookup failed; coordinates remain usable
    #[error("geocoding unavailable")]
    GeocodingUnavailable,
}

impl LocationError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "permission_denied",
            LocationError::PositionUnavailable => "position_unavailable",
            LocationError::Timeout => "timeout",
            LocationError::GeocodingUnavailable => "geocoding_unavailable",
        }
    }

    /// Whether the passive watch should stop after this error.
    pub fn ends_watch(&self) -> bool {
        matches!(self, LocationError::PermissionDenied)
    }
}

impl From<SensorError> for LocationError {
    fn from(err: SensorError) -> Self {
        match err {
            SensorError::PermissionDenied => LocationError::PermissionDenied,
            SensorError::PositionUnavailable(_) => LocationError::PositionUnavailable,
            SensorError::Timeout => LocationError::Timeout,
        }
    }
}

impl From<GeocodingError> for LocationError {
    fn from(_: GeocodingError) -> Self {
        LocationError::GeocodingUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensor_errors_map_to_kinds() {
        assert_eq!(
            LocationError::from(SensorError::PermissionDenied),
            LocationError::PermissionDenied
        );
        assert_eq!(
            LocationError::from(SensorError::PositionUnavailable("indoors".into())),
            LocationError::PositionUnavailable
        );
        assert_eq!(
            LocationError::from(SensorError::Timeout),
            LocationError::Timeout
        );
    }

    #[test]
    fn geocoding_errors_are_unavailable() {
        assert_eq!(
            LocationError::from(GeocodingError::NoResults),
            LocationError::GeocodingUnavailable
        );
    }

    #[test]
    fn only_permission_denied_ends_watch() {
        assert!(LocationError::PermissionDenied.ends_watch());
        assert!(!LocationError::PositionUnavailable.ends_watch());
        assert!(!LocationError::Timeout.ends_watch());
        assert!(!LocationError::GeocodingUnavailable.ends_watch());
    }

    #[test]
    fn codes() {
        assert_eq!(LocationError::PermissionDenied.code(), "permission_denied");
        assert_eq!(LocationError::Timeout.to_string(), "timed out waiting for a position fix");
    }
}
