use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{GatewayError, Result};

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:v=|youtu\.be/)([A-Za-z0-9_-]{11})").expect("valid pattern"));

/// Extract the 11-character video identifier from a YouTube URL.
///
/// Substring search, not a full-string match: trailing query parameters are
/// fine. Identifiers are case-sensitive and returned exactly as they appear.
pub fn extract_video_id(url: &str) -> Result<String> {
    VIDEO_ID_RE
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or(GatewayError::InvalidUrl)
}
