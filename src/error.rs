//! Error types for the typing engine.
//!
//! The engine itself performs no I/O, so the only failure a round can hit is
//! a target that normalizes to nothing. The remaining variants belong to the
//! configuration layer around it.

use thiserror::Error;

/// Raised when a round is requested for text that is empty once quotes are
/// folded and whitespace is collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("target text is empty after normalization")]
pub struct InvalidTargetError;

/// Top-level error type for fallible operations outside the engine core.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetError),

    /// File I/O error while reading or writing configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be (de)serialized
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
