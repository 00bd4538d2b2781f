//! Positioning sensor error types.

/// Errors reported by a positioning sensor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SensorError {
    /// The user or platform refused access to the sensor
    #[error("location permission denied")]
    PermissionDenied,

    /// The sensor could not produce a fix
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    /// No fix within the requested deadline
    #[error("timed out waiting for a position fix")]
    Timeout,
}
