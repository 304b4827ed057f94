//! Job record and status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metadata::MediaDescriptor;

use super::JobError;

/// Title shown until the metadata prefetch has run.
pub const PENDING_TITLE: &str = "Loading...";

/// Lifecycle status of a job.
///
/// Transitions only move forward: `starting -> downloading -> {completed, error}`.
/// A job may also fail straight from `starting`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Starting,
    Downloading,
    Completed,
    Error,
}

impl JobStatus {
    /// Returns the status as its wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Downloading => "downloading",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// Whether no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }

    /// Whether moving from `self` to `next` respects the lifecycle order.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Starting, JobStatus::Downloading)
                | (JobStatus::Starting, JobStatus::Error)
                | (JobStatus::Downloading, JobStatus::Completed)
                | (JobStatus::Downloading, JobStatus::Error)
        )
    }

    /// All statuses, in lifecycle order.
    pub fn all() -> [JobStatus; 4] {
        [
            JobStatus::Starting,
            JobStatus::Downloading,
            JobStatus::Completed,
            JobStatus::Error,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked acquisition request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    /// Percentage in 0..=100.
    pub progress: f64,
    pub downloaded_bytes: u64,
    pub total_bytes: u64,
    /// Bytes per second as last reported by the extractor.
    pub speed: f64,
    /// Artifact base name, only set once completed.
    pub filename: Option<String>,
    pub title: String,
    /// Duration in seconds.
    pub duration: u64,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<String>,
    /// User-facing failure message, only set on error.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Creates a fresh job in the `starting` state.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            status: JobStatus::Starting,
            progress: 0.0,
            downloaded_bytes: 0,
            total_bytes: 0,
            speed: 0.0,
            filename: None,
            title: PENDING_TITLE.to_string(),
            duration: 0,
            thumbnail: None,
            description: None,
            view_count: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges prefetched page metadata into the record.
    pub fn apply_descriptor(&mut self, descriptor: &MediaDescriptor) {
        self.title = descriptor.title.clone();
        self.duration = descriptor.duration;
        self.thumbnail = descriptor.thumbnail.clone();
        self.description = descriptor.description.clone();
        self.view_count = descriptor.view_count.clone();
        self.touch();
    }

    /// Moves the job into the download phase.
    pub fn begin_download(&mut self) -> Result<(), JobError> {
        self.transition(JobStatus::Downloading)
    }

    /// Records a progress sample from the extractor.
    ///
    /// The percentage never decreases while downloading; raw counters are
    /// always overwritten. Samples with an unknown total only update speed.
    pub fn record_progress(
        &mut self,
        downloaded_bytes: u64,
        total_bytes: u64,
        speed: f64,
    ) -> Result<(), JobError> {
        if self.status != JobStatus::Downloading {
            return Err(JobError::InvalidTransition {
                job_id: self.id.clone(),
                from: self.status,
                to: JobStatus::Downloading,
            });
        }

        if total_bytes > 0 {
            let pct = (downloaded_bytes as f64 / total_bytes as f64 * 100.0).clamp(0.0, 100.0);
            self.progress = self.progress.max(pct);
            self.downloaded_bytes = downloaded_bytes;
            self.total_bytes = total_bytes;
        }
        self.speed = speed;
        self.touch();
        Ok(())
    }

    /// Marks the job completed with the given artifact name.
    ///
    /// Completing an already completed job with the same file name is a no-op.
    pub fn complete(&mut self, filename: impl Into<String>) -> Result<(), JobError> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(JobError::EmptyField {
                job_id: self.id.clone(),
                field: "filename",
            });
        }
        if self.status == JobStatus::Completed && self.filename.as_deref() == Some(&filename) {
            return Ok(());
        }
        self.transition(JobStatus::Completed)?;
        self.progress = 100.0;
        self.filename = Some(filename);
        Ok(())
    }

    /// Marks the job failed with a user-facing message.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), JobError> {
        let message = message.into();
        if message.is_empty() {
            return Err(JobError::EmptyField {
                job_id: self.id.clone(),
                field: "error",
            });
        }
        self.transition(JobStatus::Error)?;
        self.error = Some(message);
        Ok(())
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), JobError> {
        if !self.status.can_transition_to(next) {
            return Err(JobError::InvalidTransition {
                job_id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
