//! Job records and the registry that tracks them.

mod registry;
mod types;

pub use registry::JobRegistry;
pub use types::{Job, JobStatus, PENDING_TITLE};

use std::fmt;

/// Error type for job registry operations.
#[derive(Debug, Clone, PartialEq)]
pub enum JobError {
    /// Job not found.
    NotFound(String),
    /// A job with this id is already tracked.
    AlreadyExists(String),
    /// The requested status change would move backwards or out of a terminal state.
    InvalidTransition {
        job_id: String,
        from: JobStatus,
        to: JobStatus,
    },
    /// A field that must be non-empty was given an empty value.
    EmptyField { job_id: String, field: &'static str },
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::NotFound(id) => write!(f, "Job not found: {}", id),
            JobError::AlreadyExists(id) => write!(f, "Job already exists: {}", id),
            JobError::InvalidTransition { job_id, from, to } => write!(
                f,
                "Cannot move job {} from {} to {}",
                job_id, from, to
            ),
            JobError::EmptyField { job_id, field } => {
                write!(f, "Job {}: {} cannot be empty", job_id, field)
            }
        }
    }
}

impl std::error::Error for JobError {}
