//! Types for the job orchestrator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::job::JobStatus;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Submitted URL was blank.
    #[error("URL is required")]
    EmptyUrl,

    /// Submitted URL is not on the allowlist.
    #[error("unsupported URL: {0}")]
    UnsupportedHost(String),

    /// Quality selector could not be parsed.
    #[error(transparent)]
    InvalidQuality(#[from] crate::strategy::InvalidQuality),

    /// Job not found.
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Job has not produced an artifact yet.
    #[error("job {job_id} is not ready: status is {status}")]
    NotReady { job_id: String, status: JobStatus },

    /// Job completed but its file is gone.
    #[error("artifact for job {0} is no longer available")]
    ArtifactMissing(String),

    /// Registry error.
    #[error("job registry error: {0}")]
    Registry(#[from] crate::job::JobError),
}

impl OrchestratorError {
    /// True for errors caused by the caller's input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrchestratorError::EmptyUrl
                | OrchestratorError::UnsupportedHost(_)
                | OrchestratorError::InvalidQuality(_)
        )
    }
}

/// A completed job's file, ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Absolute path inside the scratch directory.
    pub path: PathBuf,
    /// File name shown to the caller, without the job id prefix.
    pub display_name: String,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the background loops are running.
    pub running: bool,
    /// Jobs currently tracked by the registry.
    pub total_jobs: usize,
    pub starting_count: usize,
    pub downloading_count: usize,
    pub completed_count: usize,
    pub error_count: usize,
    /// Pipeline slots available (None when unlimited).
    pub available_slots: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_status_default() {
        let status = OrchestratorStatus::default();
        assert!(!status.running);
        assert_eq!(status.total_jobs, 0);
        assert!(status.available_slots.is_none());
    }

    #[test]
    fn test_error_display() {
        let err = OrchestratorError::JobNotFound("job-456".to_string());
        assert_eq!(err.to_string(), "job not found: job-456");

        let err = OrchestratorError::NotReady {
            job_id: "job-1".to_string(),
            status: JobStatus::Downloading,
        };
        assert_eq!(
            err.to_string(),
            "job job-1 is not ready: status is downloading"
        );
    }

    #[test]
    fn test_validation_classification() {
        assert!(OrchestratorError::EmptyUrl.is_validation());
        assert!(OrchestratorError::UnsupportedHost("x".into()).is_validation());
        assert!(!OrchestratorError::JobNotFound("x".into()).is_validation());
        assert!(!OrchestratorError::ArtifactMissing("x".into()).is_validation());
    }
}
