//! # Generation Error Types
//!
//! All errors that can occur while configuring the generator or filling chunks.

use thiserror::Error;

/// Errors that can occur in world generation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenError {
    /// A chunk-fill request had a non-positive dimension.
    ///
    /// Returned before any buffer is allocated or committed.
    #[error("invalid chunk shape {x}x{y}x{z}: every dimension must be positive")]
    InvalidShape {
        /// Requested X extent.
        x: i32,
        /// Requested Y extent.
        y: i32,
        /// Requested Z extent.
        z: i32,
    },

    /// A chunk-fill request reaches past the `i32` coordinate range, or its
    /// cell count does not fit in memory addressing.
    #[error("chunk request at {origin:?} with shape {shape:?} is out of range")]
    RequestOutOfRange {
        /// Requested origin.
        origin: [i32; 3],
        /// Requested extent.
        shape: [i32; 3],
    },

    /// A block with no fallback is missing from the registry.
    #[error("block '{name}' is not registered and has no fallback")]
    MissingBlock {
        /// Semantic block name.
        name: String,
    },

    /// Every block id is taken.
    #[error("no block ids left to register '{name}'")]
    RegistryFull {
        /// Name that could not be registered.
        name: String,
    },

    /// The world seed was already installed with a different value.
    #[error("world seed already set to {current}, refusing to change it to {requested}")]
    SeedAlreadySet {
        /// The installed seed.
        current: u64,
        /// The seed that was rejected.
        requested: u64,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("i/o error: {0}")]
    Io(String),

    /// The chunk streamer has shut down and accepts no more requests.
    #[error("chunk streamer is closed")]
    StreamerClosed,
}

impl From<toml::de::Error> for GenError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for GenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for generation operations.
pub type GenResult<T> = Result<T, GenError>;
