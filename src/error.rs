//! # Error Types
//!
//! Custom error types for PX4 Bridge using `thiserror`.
//!
//! The conversion handlers in [`crate::bridge`] never fail. These errors come
//! from around them: configuration, stdio, envelope decoding and routing.

use thiserror::Error;

/// Main error type for PX4 Bridge
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure (malformed envelope or record)
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Envelope addressed to a topic with no route
    #[error("No route for topic: {0}")]
    UnknownTopic(String),

    /// Publisher or queue failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias for PX4 Bridge
pub type Result<T> = std::result::Result<T, BridgeError>;
