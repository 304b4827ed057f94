use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requested output quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quality {
    #[default]
    Best,
    Worst,
    /// Best stream no taller than this many pixels.
    MaxHeight(u32),
}

#[derive(Debug, Error, PartialEq)]
#[error("invalid quality '{0}': expected 'best', 'worst' or a height in pixels")]
pub struct InvalidQuality(pub String);

impl Quality {
    /// yt-dlp format selector for this quality.
    pub fn format_selector(&self) -> String {
        match self {
            Quality::Best => "best[ext=mp4]/best".to_string(),
            Quality::Worst => "worst[ext=mp4]/worst".to_string(),
            Quality::MaxHeight(h) => format!(
                "best[height<={h}][ext=mp4]/best[height<={h}]/best[ext=mp4]/best",
                h = h
            ),
        }
    }
}

impl FromStr for Quality {
    type Err = InvalidQuality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "best" => Ok(Quality::Best),
            "worst" => Ok(Quality::Worst),
            other => match other.parse::<u32>() {
                Ok(h) if h > 0 => Ok(Quality::MaxHeight(h)),
                _ => Err(InvalidQuality(s.to_string())),
            },
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => f.write_str("best"),
            Quality::Worst => f.write_str("worst"),
            Quality::MaxHeight(h) => write!(f, "{}", h),
        }
    }
}
