//! Extraction collaborator boundary.
//!
//! This module provides the `Extractor` trait the strategy sequencer drives,
//! the `ProgressSink` it reports into, and a `yt-dlp` backed implementation.
//!
//! # Example
//!
//! ```ignore
//! use vidfetch_core::extractor::{ExtractionConfig, ExtractionRequest, Extractor, YtDlpExtractor};
//!
//! let extractor = YtDlpExtractor::with_defaults();
//! let request = ExtractionRequest {
//!     url: "https://m.facebook.com/watch/?v=123".to_string(),
//!     config: ExtractionConfig::minimal("/tmp/vidfetch/job_%(title)s.%(ext)s"),
//! };
//! let path = extractor.extract(&request, &sink).await?;
//! ```

mod config;
mod error;
mod traits;
mod types;
mod ytdlp;

pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use traits::{Extractor, ProgressSink};
pub use types::{ExtractionConfig, ExtractionRequest};
pub use ytdlp::YtDlpExtractor;
