/// Errors from a tag search backend
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP transport error
    #[cfg(feature = "client")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Base URL or tag could not be turned into a request URL
    #[cfg(feature = "client")]
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// API returned an error response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },
    /// JSON deserialization error
    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
}
