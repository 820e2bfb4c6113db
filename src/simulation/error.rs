//! Error types shared across the crate.

use thiserror::Error;

/// Errors raised while loading configuration, sprites or saved champions.
///
/// The simulation loop itself has no recoverable errors; everything here comes
/// from the boundaries (files, JSON, user supplied parameters).
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// A file did not contain the expected JSON.
    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
    /// A parameter value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Sprite data does not match its declared dimensions.
    #[error("invalid sprite: {0}")]
    InvalidSprite(String),
    /// A champion file was written by an incompatible version.
    #[error("champion file version {found} is not supported (expected {expected})")]
    IncompatibleChampion {
        /// Version stored in the file.
        found: u32,
        /// Version this build understands.
        expected: u32,
    },
    /// A champion brain does not have the expected input/output shape.
    #[error("champion brain maps {inputs} inputs to {outputs} outputs, expected 3 -> 1")]
    ChampionShape {
        /// Number of network inputs.
        inputs: usize,
        /// Number of network outputs.
        outputs: usize,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
