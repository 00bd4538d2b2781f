//! Geocoding error types.

/// Errors that can occur when talking to the geocoding endpoint.
#[derive(Debug, thiserror::Error)]
pub enum GeocodingError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API key rejected
    #[error("request denied: {0}")]
    Unauthorized(String),

    /// Quota exhausted
    #[error("rate limited by geocoding API")]
    RateLimited,

    /// Endpoint returned a non-success HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Endpoint answered with a non-OK `status` field
    #[error("geocoding status {status}: {message}")]
    Status { status: String, message: String },

    /// Request succeeded but matched nothing
    #[error("no geocoding results")]
    NoResults,

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// JSON parsed but lacked the fields we need
    #[error("malformed geocoding result: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GeocodingError::Status {
            status: "INVALID_REQUEST".into(),
            message: "missing latlng".into(),
        };
        assert_eq!(
            err.to_string(),
            "geocoding status INVALID_REQUEST: missing latlng"
        );

        let err = GeocodingError::Api {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        assert_eq!(GeocodingError::NoResults.to_string(), "no geocoding results");
        assert!(
            GeocodingError::Malformed("no formatted_address".into())
                .to_string()
                .contains("formatted_address")
        );
    }
}
