//! Error types for pomd-core.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for all core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Outcome store failures.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration load/save failures.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the embedded outcome store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store directory could not be opened or created.
    #[error("Failed to open outcome store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: sled::Error,
    },

    /// A read or write against the open store failed.
    #[error("Store operation failed: {0}")]
    Backend(#[from] sled::Error),

    /// A stored record did not decode the way it was written.
    #[error("Corrupt record at {key}: {message}")]
    CorruptRecord { key: String, message: String },
}

/// Errors raised while loading or saving the TOML configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file exists but does not parse.
    #[error("Invalid config: {0}")]
    ParseFailed(String),

    /// The config file could not be written.
    #[error("Failed to write config at {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// The config directory could not be resolved or created.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
