//! Common error types used throughout aniview.
//!
//! This module provides a unified error type covering the failure cases the
//! catalog core can surface: provider fetch failures, bad invalidation
//! patterns, and invalid configuration.

/// Common error type for aniview.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A catalog provider fetch failed (network, parse, upstream error).
    #[error("Provider fetch failed: {0}")]
    Provider(anyhow::Error),

    /// An invalidation pattern was not a valid regular expression.
    #[error("Invalid invalidation pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration was invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a new Provider error from any underlying fetch failure.
    pub fn provider<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Provider(err.into())
    }

    /// Create a new InvalidConfig error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
