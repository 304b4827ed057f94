//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during an extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// yt-dlp binary not found.
    #[error("yt-dlp not found at path: {path}")]
    BinaryNotFound { path: PathBuf },

    /// The extractor reported a failure.
    #[error("{message}")]
    Failed { message: String },

    /// The extractor exited successfully without naming an output file.
    #[error("extractor finished without producing a file")]
    MissingOutput,

    /// I/O error while driving the extractor.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractorError {
    /// Creates a new failure carrying the extractor's message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}
