//! Error types for the ledger core
//!
//! Contract rejections are not errors in this sense: they are verdicts and
//! live in [`crate::contracts::Rejection`]. This type covers everything
//! around verification (configuration, IO, encoding, keys, metrics).

use thiserror::Error;

/// Result type for ledger core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger core errors
#[derive(Error, Debug)]
pub enum Error {
    /// Serialization error (canonical transaction bytes)
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Malformed key material
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
