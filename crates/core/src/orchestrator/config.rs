//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Upper bound for `job_ttl_secs` (10 years).
pub const MAX_JOB_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Upper bound for `eviction_interval_secs` (1 day).
pub const MAX_EVICTION_INTERVAL_SECS: u64 = 24 * 3600;

/// Configuration for the job orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum jobs running their pipeline at once (0 = unlimited).
    /// Jobs over the limit wait in `starting` until a slot frees up.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Terminal jobs are evicted from the registry after this many seconds.
    #[serde(default = "default_job_ttl")]
    pub job_ttl_secs: u64,

    /// How often the eviction loop runs (seconds).
    #[serde(default = "default_eviction_interval")]
    pub eviction_interval_secs: u64,
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_job_ttl() -> u64 {
    3600 // 1 hour
}

fn default_eviction_interval() -> u64 {
    60
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            job_ttl_secs: default_job_ttl(),
            eviction_interval_secs: default_eviction_interval(),
        }
    }
}

impl OrchestratorConfig {
    /// Terminal job TTL as a signed duration, saturating at `TimeDelta::MAX`.
    pub fn job_ttl(&self) -> chrono::Duration {
        i64::try_from(self.job_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }
}
