//! Maps extractor failure text to user-facing categories.

use serde::{Deserialize, Serialize};

/// Category of a failed acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    AccessBlocked,
    Unavailable,
    QualityUnavailable,
    NoStream,
    Generic,
}

/// Extractor could not read the page at all; treated as blocked before anything else.
const PAGE_UNREADABLE: &[&str] = &["Cannot parse data"];
const UNAVAILABLE: &[&str] = &[
    "Video unavailable",
    "This video is private",
    "has been removed",
];
const QUALITY_UNAVAILABLE: &[&str] = &["Requested format is not available"];
const NO_STREAM: &[&str] = &["No video formats found", "Unsupported URL"];
const ACCESS_BLOCKED: &[&str] = &[
    "400 Client Error",
    "HTTP Error 403",
    "login required",
    "log in to",
];

/// Checked top to bottom. Content-specific categories come before the
/// transport and auth errors that often accompany them.
const RULES: &[(&[&str], FailureKind)] = &[
    (PAGE_UNREADABLE, FailureKind::AccessBlocked),
    (UNAVAILABLE, FailureKind::Unavailable),
    (QUALITY_UNAVAILABLE, FailureKind::QualityUnavailable),
    (NO_STREAM, FailureKind::NoStream),
    (ACCESS_BLOCKED, FailureKind::AccessBlocked),
];

impl FailureKind {
    /// Classify a failure message. First matching rule wins.
    pub fn classify(detail: &str) -> Self {
        RULES
            .iter()
            .find(|(patterns, _)| patterns.iter().any(|p| detail.contains(p)))
            .map(|(_, kind)| *kind)
            .unwrap_or(FailureKind::Generic)
    }

    /// Metric label.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AccessBlocked => "access_blocked",
            FailureKind::Unavailable => "unavailable",
            FailureKind::QualityUnavailable => "quality_unavailable",
            FailureKind::NoStream => "no_stream",
            FailureKind::Generic => "generic",
        }
    }

    /// Message shown to the caller. `detail` is only used for `Generic`.
    pub fn user_message(&self, detail: &str) -> String {
        match self {
            FailureKind::AccessBlocked => "Facebook blocked access to this video. It may be private or require login. Try a different public video or check if the URL is correct.".to_string(),
            FailureKind::Unavailable => "This video is not available for download. It might be private, deleted, or region-restricted.".to_string(),
            FailureKind::QualityUnavailable => "The requested quality is not available for this video. Try selecting 'Best Quality' instead.".to_string(),
            FailureKind::NoStream => "No downloadable video found at this URL. Make sure it's a direct link to a Facebook video.".to_string(),
            FailureKind::Generic => format!("Download failed: {}", detail),
        }
    }
}
