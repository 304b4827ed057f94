//! Types for the extractor module.

use serde::{Deserialize, Serialize};

/// Options for a single extraction attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Output path template, e.g. `/tmp/vidfetch/<job>_%(title)s.%(ext)s`.
    pub output_template: String,
    /// Format selector expression.
    pub format: String,
    /// Extra HTTP headers sent by the extractor.
    #[serde(default)]
    pub http_headers: Vec<(String, String)>,
    /// Extractor hints in `extractor:key=value` form.
    #[serde(default)]
    pub extractor_args: Vec<String>,
    /// Skip site-specific extractors.
    #[serde(default)]
    pub force_generic: bool,
    /// Suppress extractor warnings.
    #[serde(default)]
    pub no_warnings: bool,
}

impl ExtractionConfig {
    /// `best` format, warnings suppressed, nothing else.
    pub fn minimal(output_template: impl Into<String>) -> Self {
        Self {
            output_template: output_template.into(),
            format: "best".to_string(),
            http_headers: Vec::new(),
            extractor_args: Vec::new(),
            force_generic: false,
            no_warnings: true,
        }
    }
}

/// One URL plus the options to drive it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub url: String,
    pub config: ExtractionConfig,
}
