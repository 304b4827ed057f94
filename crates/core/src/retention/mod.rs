//! Time-bounded retention of produced files.
//!
//! Two mechanisms remove artifacts from the scratch directory:
//! - **Sweep**: any regular file older than the TTL, periodically and on demand
//! - **Post-serve deletion**: a served file is removed after a grace period

mod config;
mod manager;

pub use config::{
    RetentionConfig, MAX_FILE_TTL_SECS, MAX_SERVE_GRACE_MS, MAX_SWEEP_INTERVAL_SECS,
};
pub use manager::{RetentionManager, SweepReport};

use thiserror::Error;

/// Errors raised by retention operations.
#[derive(Debug, Error)]
pub enum RetentionError {
    #[error("failed to read scratch directory {path}: {source}")]
    ReadDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("retention scheduler is not accepting requests")]
    SchedulerClosed,
}
