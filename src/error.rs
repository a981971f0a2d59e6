//! Admin client error types

use thiserror::Error;

/// Admin client error type
#[derive(Debug, Error)]
pub enum AdminError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// Server answered with an HTML page
    #[error("Server returned HTML page instead of JSON. This usually means authentication is required or the endpoint is incorrect.")]
    UnexpectedHtml,

    /// A form field could not be coerced into what the endpoint needs
    #[error("Invalid field: {0}")]
    Coercion(String),

    /// No handler is bound to the given control and event
    #[error("No handler registered for control '{0}'")]
    UnknownControl(String),

    /// Websocket transport failure
    #[cfg(feature = "live")]
    #[error("Socket error: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed Engine.IO / Socket.IO packet
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Settings file I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file serialization
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for admin client operations
pub type Result<T> = std::result::Result<T, AdminError>;
