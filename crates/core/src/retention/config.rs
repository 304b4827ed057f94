//! Retention configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Upper bound for `file_ttl_secs` (10 years).
pub const MAX_FILE_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Upper bound for `sweep_interval_secs` (1 day).
pub const MAX_SWEEP_INTERVAL_SECS: u64 = 24 * 3600;

/// Upper bound for `serve_grace_ms` (1 day). Removal delays are clamped to it.
pub const MAX_SERVE_GRACE_MS: u64 = 24 * 3600 * 1000;

/// Configuration for artifact retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Directory all artifacts are written to.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// Files older than this many seconds are removed by the sweep.
    #[serde(default = "default_file_ttl")]
    pub file_ttl_secs: u64,

    /// How often the background sweep runs (seconds).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Delay between serving a file and deleting it (milliseconds).
    #[serde(default = "default_serve_grace")]
    pub serve_grace_ms: u64,
}

fn default_scratch_dir() -> PathBuf {
    std::env::temp_dir().join("vidfetch")
}

fn default_file_ttl() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    300 // 5 minutes
}

fn default_serve_grace() -> u64 {
    60_000 // 1 minute
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            file_ttl_secs: default_file_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            serve_grace_ms: default_serve_grace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetentionConfig::default();
        assert!(config.scratch_dir.ends_with("vidfetch"));
        assert_eq!(config.file_ttl_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 300);
        assert_eq!(config.serve_grace_ms, 60_000);
    }

    #[test]
    fn test_deserialize_partial() {
        let toml = r#"
            file_ttl_secs = 60
        "#;
        let config: RetentionConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.file_ttl_secs, 60);
        assert_eq!(config.serve_grace_ms, 60_000);
    }
}
