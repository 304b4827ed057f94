use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::extractor::ExtractorConfig;
use crate::metadata::MetadataConfig;
use crate::orchestrator::OrchestratorConfig;
use crate::retention::RetentionConfig;
use crate::urls::UrlPolicyConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub urls: UrlPolicyConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.orchestrator.max_concurrent_jobs, 4);
        assert_eq!(config.retention.file_ttl_secs, 3600);
        assert_eq!(config.retention.serve_grace_ms, 60_000);
        assert_eq!(config.extractor.ytdlp_path.to_str().unwrap(), "yt-dlp");
        assert_eq!(config.metadata.timeout_secs, 10);
        assert!(config
            .urls
            .allowed_hosts
            .contains(&"www.facebook.com".to_string()));
    }

    #[test]
    fn test_deserialize_server_section() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
    }

    #[test]
    fn test_deserialize_retention_section() {
        let toml = r#"
[retention]
scratch_dir = "/var/tmp/vidfetch"
file_ttl_secs = 120
serve_grace_ms = 500
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.retention.scratch_dir.to_str().unwrap(),
            "/var/tmp/vidfetch"
        );
        assert_eq!(config.retention.file_ttl_secs, 120);
        assert_eq!(config.retention.serve_grace_ms, 500);
        // Untouched fields keep their defaults
        assert_eq!(config.retention.sweep_interval_secs, 300);
    }

    #[test]
    fn test_deserialize_custom_allowlist() {
        let toml = r#"
[urls]
allowed_hosts = ["example.com"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.urls.allowed_hosts, vec!["example.com".to_string()]);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let config = Config::default();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["server"]["port"], 8080);
        assert_eq!(json["orchestrator"]["job_ttl_secs"], 3600);
    }
}
