//! Host allowlist and URL variant rewriting.

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for accepted source URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlPolicyConfig {
    /// Hosts a submitted URL may point at. Matched exactly, ignoring case.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

fn default_allowed_hosts() -> Vec<String> {
    ["facebook.com", "www.facebook.com", "m.facebook.com", "fb.watch"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UrlPolicyConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
        }
    }
}

const MOBILE_HOST: &str = "m.facebook.com";

/// Pure URL checks and rewrites.
#[derive(Debug, Clone)]
pub struct UrlPolicy {
    allowed_hosts: Vec<String>,
}

impl UrlPolicy {
    pub fn new(config: &UrlPolicyConfig) -> Self {
        Self {
            allowed_hosts: config
                .allowed_hosts
                .iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
        }
    }

    /// True only if `url` parses and its host is on the allowlist.
    pub fn is_acceptable(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return false;
        };
        match parsed.host_str() {
            // `Url` already lowercases domain hosts
            Some(host) => self.allowed_hosts.iter().any(|h| h == host),
            None => false,
        }
    }

    /// Rewrites desktop hosts to the mobile site. Anything else comes back unchanged.
    pub fn to_mobile_variant(&self, url: &str) -> String {
        let Ok(mut parsed) = Url::parse(url) else {
            return url.to_string();
        };
        let is_desktop = matches!(
            parsed.host_str(),
            Some("www.facebook.com") | Some("facebook.com")
        );
        if !is_desktop || parsed.set_host(Some(MOBILE_HOST)).is_err() {
            return url.to_string();
        }
        parsed.to_string()
    }
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self::new(&UrlPolicyConfig::default())
    }
}
