//! Candidate attempt list.

use std::collections::HashSet;

use crate::extractor::{ExtractionConfig, ExtractionRequest};
use crate::urls::UrlPolicy;

use super::Quality;

/// Desktop browser header set used by the full configuration.
const DESKTOP_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    ),
    (
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ),
    ("Accept-Language", "en-US,en;q=0.5"),
    ("Accept-Encoding", "gzip, deflate"),
    ("Connection", "keep-alive"),
    ("Upgrade-Insecure-Requests", "1"),
];

const FACEBOOK_HINT: &str = "facebook:tab_name=videos";

/// Which rung of the fallback ladder an attempt is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    MobileFull,
    OriginalFull,
    MobileMinimal,
    OriginalGeneric,
}

impl AttemptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptKind::MobileFull => "mobile_full",
            AttemptKind::OriginalFull => "original_full",
            AttemptKind::MobileMinimal => "mobile_minimal",
            AttemptKind::OriginalGeneric => "original_generic",
        }
    }
}

/// One (URL variant, configuration) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attempt {
    pub kind: AttemptKind,
    pub request: ExtractionRequest,
}

fn full_config(quality: Quality, output_template: &str) -> ExtractionConfig {
    ExtractionConfig {
        output_template: output_template.to_string(),
        format: quality.format_selector(),
        http_headers: DESKTOP_HEADERS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        extractor_args: vec![FACEBOOK_HINT.to_string()],
        force_generic: false,
        no_warnings: false,
    }
}

/// Build the ordered attempt list for one job.
///
/// A URL variant is only ever used by its first attempt, so later rungs that
/// reuse an already tried URL are dropped.
pub fn build_attempts(
    policy: &UrlPolicy,
    url: &str,
    quality: Quality,
    output_template: &str,
) -> Vec<Attempt> {
    let mobile = policy.to_mobile_variant(url);
    let generic = ExtractionConfig {
        force_generic: true,
        ..ExtractionConfig::minimal(output_template)
    };

    let candidates = [
        (AttemptKind::MobileFull, mobile.clone(), full_config(quality, output_template)),
        (AttemptKind::OriginalFull, url.to_string(), full_config(quality, output_template)),
        (AttemptKind::MobileMinimal, mobile, ExtractionConfig::minimal(output_template)),
        (AttemptKind::OriginalGeneric, url.to_string(), generic),
    ];

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|(_, url, _)| seen.insert(url.clone()))
        .map(|(kind, url, config)| Attempt {
            kind,
            request: ExtractionRequest { url, config },
        })
        .collect()
}
