//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the collaborator traits,
//! so the orchestrator can be driven end to end without yt-dlp or network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use vidfetch_core::testing::{MockExtractor, MockMetadataFetcher};
//!
//! let extractor = MockExtractor::new();
//! extractor.write_file_for("https://m.facebook.com/watch/?v=1", "clip").await;
//! extractor.set_progress_steps(vec![(10, 100), (100, 100)]).await;
//!
//! let metadata = MockMetadataFetcher::new();
//! metadata.set_descriptor(fixtures::descriptor("Cat video")).await;
//! ```

mod mock_extractor;
mod mock_metadata;

pub use mock_extractor::{MockExtractor, MockOutcome};
pub use mock_metadata::MockMetadataFetcher;

use std::path::Path;

use crate::extractor::ProgressSink;

/// Progress sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_progress(&self, _downloaded: u64, _total: u64, _speed: f64) {}

    fn on_finished(&self, _path: &Path) {}
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime};

    use crate::metadata::MediaDescriptor;

    /// A descriptor with the given title and a few populated fields.
    pub fn descriptor(title: &str) -> MediaDescriptor {
        MediaDescriptor {
            title: title.to_string(),
            duration: 42,
            thumbnail: Some("https://cdn.example/thumb.jpg".to_string()),
            description: Some(format!("About {}", title)),
            view_count: None,
        }
    }

    /// Write a file whose modification time lies `age` in the past.
    pub fn write_aged_file(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"artifact").unwrap();
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }
}
