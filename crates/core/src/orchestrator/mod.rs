//! Job orchestrator.
//!
//! The orchestrator drives each submitted job through its pipeline:
//! - **Validation**: URL allowlist and quality parsing, synchronous
//! - **Pipeline**: metadata prefetch then the strategy sequencer, one task per job
//! - **Eviction**: terminal jobs leave the registry after a TTL

mod config;
mod runner;
mod types;

pub use config::{OrchestratorConfig, MAX_EVICTION_INTERVAL_SECS, MAX_JOB_TTL_SECS};
pub use runner::JobOrchestrator;
pub use types::{Artifact, OrchestratorError, OrchestratorStatus};
