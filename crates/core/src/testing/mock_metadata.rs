//! Mock metadata fetcher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::metadata::{MediaDescriptor, MetadataFetcher};

/// Mock implementation of the MetadataFetcher trait.
///
/// Returns the configured descriptor (default: the fallback descriptor)
/// and records every URL it was asked about.
#[derive(Debug, Default)]
pub struct MockMetadataFetcher {
    descriptor: Arc<RwLock<Option<MediaDescriptor>>>,
    delay: Arc<RwLock<Duration>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockMetadataFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the descriptor returned by every fetch.
    pub async fn set_descriptor(&self, descriptor: MediaDescriptor) {
        *self.descriptor.write().await = Some(descriptor);
    }

    /// Delay every fetch.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// URLs fetched so far.
    pub async fn fetched_urls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl MetadataFetcher for MockMetadataFetcher {
    async fn fetch(&self, url: &str) -> MediaDescriptor {
        self.calls.write().await.push(url.to_string());
        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.descriptor.read().await.clone().unwrap_or_default()
    }
}
