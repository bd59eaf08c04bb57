//! Error types for the GraphQL client

use thiserror::Error;

use crate::types::GraphqlErrorEntry;

/// GraphQL client error
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned a non-success status
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Server answered with GraphQL errors in the response body
    #[error("GraphQL errors: {}", join_messages(.0))]
    Graphql(Vec<GraphqlErrorEntry>),

    /// Response body was not a usable GraphQL envelope
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configured endpoint is not a valid absolute URL
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Token could not be encoded as a header value
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Result required from cache but not present
    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

fn join_messages(errors: &[GraphqlErrorEntry]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
