//! PromQL-specific error types

/// Errors that can occur while parsing, converting or formatting PromQL
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PromQLError {
    /// Error parsing the PromQL query syntax
    #[error("PromQL parse error: {0}")]
    ParseError(String),
    /// Construct the AST cannot represent
    #[error("Unsupported PromQL feature: {0}")]
    UnsupportedFeature(String),
}
