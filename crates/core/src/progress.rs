//! Progress sink bound to a single job.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::extractor::ProgressSink;
use crate::job::{JobError, JobRegistry};

/// Writes extractor progress into one job's registry record.
///
/// Each job gets its own reporter, so concurrent jobs never write into
/// each other's records.
pub struct ProgressReporter {
    registry: Arc<JobRegistry>,
    job_id: String,
}

impl ProgressReporter {
    pub fn new(registry: Arc<JobRegistry>, job_id: impl Into<String>) -> Self {
        Self {
            registry,
            job_id: job_id.into(),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl ProgressSink for ProgressReporter {
    fn on_progress(&self, downloaded: u64, total: u64, speed: f64) {
        let result = self
            .registry
            .update(&self.job_id, |job| job.record_progress(downloaded, total, speed));
        if let Err(e) = result {
            // Late samples after a terminal transition are expected
            debug!("Ignoring progress for job {}: {}", self.job_id, e);
        }
    }

    fn on_finished(&self, path: &Path) {
        let Some(filename) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            warn!(
                "Job {}: finished path {} has no file name",
                self.job_id,
                path.display()
            );
            return;
        };

        match self
            .registry
            .update(&self.job_id, |job| job.complete(filename.clone()))
        {
            Ok(()) => debug!("Job {} completed with {}", self.job_id, filename),
            Err(e @ JobError::InvalidTransition { .. }) => {
                warn!("Job {}: completion rejected: {}", self.job_id, e)
            }
            Err(e) => warn!("Job {}: failed to record completion: {}", self.job_id, e),
        }
    }
}
