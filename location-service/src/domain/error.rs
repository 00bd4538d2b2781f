//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from sensor, network and storage errors.

/// Domain-level errors for coordinate and station validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Latitude is not a finite value in [-90, 90]
    #[error("invalid latitude {0}: must be within [-90, 90]")]
    InvalidLatitude(f64),

    /// Longitude is not a finite value in [-180, 180]
    #[error("invalid longitude {0}: must be within [-180, 180]")]
    InvalidLongitude(f64),

    /// Fuel type name not recognised
    #[error("unknown fuel type: {0}")]
    UnknownFuelType(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLatitude(91.0);
        assert_eq!(err.to_string(), "invalid latitude 91: must be within [-90, 90]");

        let err = DomainError::InvalidLongitude(-180.5);
        assert_eq!(
            err.to_string(),
            "invalid longitude -180.5: must be within [-180, 180]"
        );

        let err = DomainError::UnknownFuelType("kerosene".into());
        assert_eq!(err.to_string(), "unknown fuel type: kerosene");
    }
}
