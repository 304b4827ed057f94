//! Trait definitions for the extractor module.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::error::ExtractorError;
use super::types::ExtractionRequest;

/// Receives progress from the running extraction attempt.
///
/// Calls are synchronous and made from the attempt's own task.
pub trait ProgressSink: Send + Sync {
    /// Bytes downloaded so far, total bytes (0 when unknown) and speed in bytes/s.
    fn on_progress(&self, downloaded: u64, total: u64, speed: f64);

    /// The attempt produced its final file.
    fn on_finished(&self, path: &Path);
}

/// A media extractor that downloads one URL into one file.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns the name of this extractor implementation.
    fn name(&self) -> &str;

    /// Runs one extraction attempt, reporting into `sink`.
    ///
    /// Returns the path of the produced file.
    async fn extract(
        &self,
        request: &ExtractionRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, ExtractorError>;
}
