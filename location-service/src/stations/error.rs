//! Backend station API error types.

/// Errors that can occur when fetching the station list.
#[derive(Debug, thiserror::Error)]
pub enum StationError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication failed
    #[error("unauthorized: check BACKEND_API_KEY")]
    Unauthorized,

    /// Invalid client configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },
}
