//! Sequential execution of attempts.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::extractor::{Extractor, ExtractorError, ProgressSink};
use crate::metrics;

use super::Attempt;

/// The attempt that succeeded and what it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOutcome {
    /// Zero-based index into the attempt list.
    pub attempt: usize,
    pub path: PathBuf,
}

/// Runs attempts in order until one succeeds.
pub struct StrategySequencer {
    extractor: Arc<dyn Extractor>,
}

impl StrategySequencer {
    pub fn new(extractor: Arc<dyn Extractor>) -> Self {
        Self { extractor }
    }

    /// Run `attempts` in order. The first success ends the sequence.
    ///
    /// When every attempt fails the last failure is returned.
    pub async fn run(
        &self,
        job_id: &str,
        attempts: &[Attempt],
        sink: &dyn ProgressSink,
    ) -> Result<SequenceOutcome, ExtractorError> {
        let mut last_error = ExtractorError::failed("no extraction attempts available");

        for (index, attempt) in attempts.iter().enumerate() {
            info!(
                "Job {}: attempt {}/{} ({}) via {} for {}",
                job_id,
                index + 1,
                attempts.len(),
                attempt.kind.as_str(),
                self.extractor.name(),
                attempt.request.url
            );

            match self.extractor.extract(&attempt.request, sink).await {
                Ok(path) => {
                    metrics::EXTRACTION_ATTEMPTS
                        .with_label_values(&["success"])
                        .inc();
                    info!("Job {}: attempt {} succeeded", job_id, index + 1);
                    return Ok(SequenceOutcome {
                        attempt: index,
                        path,
                    });
                }
                Err(e) => {
                    metrics::EXTRACTION_ATTEMPTS
                        .with_label_values(&["failed"])
                        .inc();
                    warn!("Job {}: attempt {} failed: {}", job_id, index + 1, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{build_attempts, Quality};
    use crate::testing::{MockExtractor, NullSink};
    use crate::urls::UrlPolicy;

    fn attempts(url: &str) -> Vec<Attempt> {
        build_attempts(&UrlPolicy::default(), url, Quality::Best, "/tmp/j_%(title)s.%(ext)s")
    }

    #[tokio::test]
    async fn test_first_success_stops_sequence() {
        let mock = Arc::new(MockExtractor::new());
        mock.fail_url("https://m.facebook.com/watch/?v=1", "ERROR: Cannot parse data")
            .await;
        mock.succeed_url("https://www.facebook.com/watch/?v=1", "/tmp/j_clip.mp4")
            .await;
        let sequencer = StrategySequencer::new(mock.clone());

        let outcome = sequencer
            .run("j", &attempts("https://www.facebook.com/watch/?v=1"), &NullSink)
            .await
            .unwrap();

        assert_eq!(outcome.attempt, 1);
        assert_eq!(outcome.path, PathBuf::from("/tmp/j_clip.mp4"));
        assert_eq!(mock.called_urls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_skips_rest() {
        let mock = Arc::new(MockExtractor::new());
        mock.succeed_url("https://m.facebook.com/watch/?v=1", "/tmp/j_a.mp4")
            .await;
        let sequencer = StrategySequencer::new(mock.clone());

        let outcome = sequencer
            .run("j", &attempts("https://www.facebook.com/watch/?v=1"), &NullSink)
            .await
            .unwrap();
        assert_eq!(outcome.attempt, 0);
        assert_eq!(
            mock.called_urls().await,
            vec!["https://m.facebook.com/watch/?v=1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_all_failures_return_last_error() {
        let mock = Arc::new(MockExtractor::new());
        mock.fail_url("https://m.facebook.com/watch/?v=1", "first").await;
        mock.fail_url("https://www.facebook.com/watch/?v=1", "second")
            .await;
        let sequencer = StrategySequencer::new(mock.clone());

        let err = sequencer
            .run("j", &attempts("https://www.facebook.com/watch/?v=1"), &NullSink)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "second");
    }

    #[tokio::test]
    async fn test_empty_attempt_list_fails() {
        let sequencer = StrategySequencer::new(Arc::new(MockExtractor::new()));
        assert!(sequencer.run("j", &[], &NullSink).await.is_err());
    }
}
