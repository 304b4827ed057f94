//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::extractor::{ExtractionRequest, Extractor, ExtractorError, ProgressSink};

/// Scripted result for one URL.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this path without touching the filesystem.
    Path(PathBuf),
    /// Render the output template with this title and `mp4`, write the file, return it.
    Write { title: String },
    /// Fail with this message.
    Fail(String),
    /// Panic inside the extraction call.
    Panic(String),
}

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Script success/failure per URL
/// - Emit progress samples before finishing
/// - Record every request for assertions
/// - Track peak concurrency
///
/// Unscripted URLs fail with an `Unsupported URL` message.
#[derive(Debug)]
pub struct MockExtractor {
    outcomes: Arc<RwLock<HashMap<String, MockOutcome>>>,
    /// Recorded requests in call order.
    calls: Arc<RwLock<Vec<ExtractionRequest>>>,
    /// (downloaded, total) samples emitted before the outcome.
    progress_steps: Arc<RwLock<Vec<(u64, u64)>>>,
    /// Pause after every progress sample.
    step_delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    /// Create a new mock extractor.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(Vec::new())),
            progress_steps: Arc::new(RwLock::new(Vec::new())),
            step_delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script the outcome for a URL.
    pub async fn set_outcome(&self, url: &str, outcome: MockOutcome) {
        self.outcomes.write().await.insert(url.to_string(), outcome);
    }

    /// Succeed for `url`, returning `path` as-is.
    pub async fn succeed_url(&self, url: &str, path: impl Into<PathBuf>) {
        self.set_outcome(url, MockOutcome::Path(path.into())).await;
    }

    /// Succeed for `url` by writing a real file named after `title`.
    pub async fn write_file_for(&self, url: &str, title: &str) {
        self.set_outcome(
            url,
            MockOutcome::Write {
                title: title.to_string(),
            },
        )
        .await;
    }

    /// Fail for `url` with `message`.
    pub async fn fail_url(&self, url: &str, message: &str) {
        self.set_outcome(url, MockOutcome::Fail(message.to_string()))
            .await;
    }

    /// Set progress samples emitted by every call.
    pub async fn set_progress_steps(&self, steps: Vec<(u64, u64)>) {
        *self.progress_steps.write().await = steps;
    }

    /// Set the pause after each progress sample.
    pub async fn set_step_delay(&self, delay: Duration) {
        *self.step_delay.write().await = delay;
    }

    /// All recorded requests.
    pub async fn recorded_requests(&self) -> Vec<ExtractionRequest> {
        self.calls.read().await.clone()
    }

    /// URLs in call order.
    pub async fn called_urls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// Highest number of simultaneous `extract` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn run(
        &self,
        request: &ExtractionRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, ExtractorError> {
        let steps = self.progress_steps.read().await.clone();
        let delay = *self.step_delay.read().await;
        for (downloaded, total) in steps {
            sink.on_progress(downloaded, total, 1024.0);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        let outcome = self.outcomes.read().await.get(&request.url).cloned();
        let path = match outcome {
            Some(MockOutcome::Path(path)) => path,
            Some(MockOutcome::Write { title }) => {
                let path = PathBuf::from(
                    request
                        .config
                        .output_template
                        .replace("%(title)s", &title)
                        .replace("%(ext)s", "mp4"),
                );
                tokio::fs::write(&path, b"mock video data").await?;
                path
            }
            Some(MockOutcome::Fail(message)) => return Err(ExtractorError::failed(message)),
            Some(MockOutcome::Panic(message)) => panic!("{}", message),
            None => {
                return Err(ExtractorError::failed(format!(
                    "ERROR: Unsupported URL: {}",
                    request.url
                )))
            }
        };

        sink.on_finished(&path);
        Ok(path)
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        request: &ExtractionRequest,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, ExtractorError> {
        self.calls.write().await.push(request.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let result = self.run(request, sink).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::ExtractionConfig;
    use crate::testing::NullSink;

    fn request(url: &str, template: &str) -> ExtractionRequest {
        ExtractionRequest {
            url: url.to_string(),
            config: ExtractionConfig::minimal(template),
        }
    }

    #[tokio::test]
    async fn test_unscripted_url_fails() {
        let mock = MockExtractor::new();
        let err = mock
            .extract(&request("https://x/1", "/tmp/%(title)s.%(ext)s"), &NullSink)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unsupported URL"));
        assert_eq!(mock.called_urls().await, vec!["https://x/1".to_string()]);
    }

    #[tokio::test]
    async fn test_write_outcome_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let template = format!("{}/job_%(title)s.%(ext)s", dir.path().display());
        let mock = MockExtractor::new();
        mock.write_file_for("https://x/1", "clip").await;

        let path = mock
            .extract(&request("https://x/1", &template), &NullSink)
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("job_clip.mp4"));
        assert!(path.exists());
        assert_eq!(mock.max_in_flight(), 1);
    }
}
