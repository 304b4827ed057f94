use super::{types::Config, ConfigError};

use crate::orchestrator::{MAX_EVICTION_INTERVAL_SECS, MAX_JOB_TTL_SECS};
use crate::retention::{MAX_FILE_TTL_SECS, MAX_SERVE_GRACE_MS, MAX_SWEEP_INTERVAL_SECS};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Retention TTL and intervals are non-zero and within their upper bounds
/// - Eviction settings are non-zero and within their upper bounds
/// - The serve grace period is within its upper bound
/// - The host allowlist is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    check_range(
        "retention.file_ttl_secs",
        config.retention.file_ttl_secs,
        MAX_FILE_TTL_SECS,
    )?;
    check_range(
        "retention.sweep_interval_secs",
        config.retention.sweep_interval_secs,
        MAX_SWEEP_INTERVAL_SECS,
    )?;
    check_range(
        "orchestrator.eviction_interval_secs",
        config.orchestrator.eviction_interval_secs,
        MAX_EVICTION_INTERVAL_SECS,
    )?;
    check_range(
        "orchestrator.job_ttl_secs",
        config.orchestrator.job_ttl_secs,
        MAX_JOB_TTL_SECS,
    )?;

    // Zero is allowed: the file is removed right after serving
    if config.retention.serve_grace_ms > MAX_SERVE_GRACE_MS {
        return Err(ConfigError::ValidationError(format!(
            "retention.serve_grace_ms cannot exceed {}",
            MAX_SERVE_GRACE_MS
        )));
    }

    if config.urls.allowed_hosts.is_empty() {
        return Err(ConfigError::ValidationError(
            "urls.allowed_hosts cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn check_range(field: &str, value: u64, max: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot be 0",
            field
        )));
    }
    if value > max {
        return Err(ConfigError::ValidationError(format!(
            "{} cannot exceed {}",
            field, max
        )));
    }
    Ok(())
}
