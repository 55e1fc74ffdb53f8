use tempo_api::ClientError;

/// Errors from completing a TraceQL query
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// The tag search backend failed
    #[error("Tag search failed: {0}")]
    Client(#[from] ClientError),
}
