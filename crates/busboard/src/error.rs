//! Error types for busboard
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Main error type for the busboard core
#[derive(Error, Debug)]
pub enum BusError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid bound '{0}' (expected O, I, outbound or inbound)")]
    InvalidBound(String),

    #[error("Map error: {0}")]
    Map(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for busboard
pub type Result<T> = std::result::Result<T, BusError>;
