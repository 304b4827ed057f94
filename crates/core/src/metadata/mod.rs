//! Page metadata prefetch.
//!
//! A [`MetadataFetcher`] never fails from the caller's point of view: any
//! problem collapses into [`MediaDescriptor::default`].

mod config;
mod page;

pub use config::MetadataConfig;
pub use page::{parse_page, PageMetadataFetcher};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Title used when nothing better is known.
pub const DEFAULT_TITLE: &str = "Facebook Video";

/// Descriptive fields merged into a job before the download starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub title: String,
    /// Duration in seconds, 0 when unknown.
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<String>,
}

impl Default for MediaDescriptor {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            duration: 0,
            thumbnail: None,
            description: None,
            view_count: None,
        }
    }
}

/// Internal failures of a fetch attempt. Never crosses the trait boundary.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("no attempt returned a page")]
    Exhausted,
}

/// Best-effort source of page metadata.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch descriptive metadata for `url`. Returns the default descriptor on failure.
    async fn fetch(&self, url: &str) -> MediaDescriptor;
}
