//! Error types for segue-player
//!
//! Module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for the segue-player service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Clip source failed to load or play
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Playback engine errors
    #[error("Playback error: {0}")]
    Playback(String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Errors bubbled up from segue-common
    #[error(transparent)]
    Common(#[from] segue_common::Error),
}

/// Convenience Result type using segue-player Error
pub type Result<T> = std::result::Result<T, Error>;
