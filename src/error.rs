//! Error types for GreenOps

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Carbon intensity provider answered with a non-success status
    #[error("Network error: {0}")]
    NetworkError(String),

    /// HTTP request to a carbon intensity provider failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Provider has no reading for the requested region
    #[error("No carbon intensity data for region: {0}")]
    RegionNotFound(String),

    /// Provider response could not be interpreted
    #[error("Failed to parse provider response: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Failed to parse config file: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
