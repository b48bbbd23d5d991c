use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{GatewayError, Result};

const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player?key=";

static INNERTUBE_API_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#).expect("valid pattern"));

/// A single timed caption entry, passed through to clients as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptEntry>>;
}

/// Fetches captions through YouTube's InnerTube player API: the watch page
/// yields an API key, the player response lists caption tracks, and each
/// track resolves to a timed-text document.
pub struct YouTubeTranscriptClient {
    client: Client,
}

impl YouTubeTranscriptClient {
    pub fn new() -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_static("en-US"),
        );

        let client = ClientBuilder::new()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36")
            .cookie_store(true)
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { client })
    }

    async fn fetch_watch_html(&self, video_id: &str) -> Result<String> {
        let url = format!("{}{}", WATCH_URL, video_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Retrieval(format!(
                "watch page returned {} for video {}",
                response.status(),
                video_id
            )));
        }

        response
            .text()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))
    }

    fn extract_api_key(html: &str, video_id: &str) -> Result<String> {
        INNERTUBE_API_KEY_RE
            .captures(html)
            .and_then(|captures| captures.get(1))
            .map(|key| key.as_str().to_string())
            .ok_or_else(|| {
                GatewayError::Retrieval(format!("no InnerTube API key found for video {}", video_id))
            })
    }

    async fn fetch_player_response(&self, video_id: &str, api_key: &str) -> Result<Value> {
        let url = format!("{}{}", INNERTUBE_PLAYER_URL, api_key);
        let body = serde_json::json!({
            "context": {
                "client": {
                    "clientName": "ANDROID",
                    "clientVersion": "20.10.38"
                }
            },
            "videoId": video_id
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Retrieval(format!(
                "player API returned {} for video {}",
                response.status(),
                video_id
            )));
        }

        response
            .json()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))
    }

    /// Pick an English track when one exists, otherwise the first listed.
    fn select_track_url(player: &Value, video_id: &str) -> Result<String> {
        let tracks = player
            .get("captions")
            .and_then(|c| c.get("playerCaptionsTracklistRenderer"))
            .and_then(|r| r.get("captionTracks"))
            .and_then(|t| t.as_array())
            .filter(|tracks| !tracks.is_empty())
            .ok_or_else(|| {
                GatewayError::Retrieval(format!("no caption tracks for video {}", video_id))
            })?;

        let track = tracks
            .iter()
            .find(|track| {
                track
                    .get("languageCode")
                    .and_then(|l| l.as_str())
                    .map(|l| l.starts_with("en"))
                    .unwrap_or(false)
            })
            .unwrap_or(&tracks[0]);

        track
            .get("baseUrl")
            .and_then(|u| u.as_str())
            .map(|u| u.to_string())
            .ok_or_else(|| {
                GatewayError::Retrieval(format!("caption track missing baseUrl for video {}", video_id))
            })
    }

    async fn fetch_track(&self, base_url: &str, video_id: &str) -> Result<Vec<TranscriptEntry>> {
        let url = format!("{}&fmt=json3", base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))?;

        if !response.status().is_success() {
            return Err(GatewayError::Retrieval(format!(
                "timed-text fetch returned {} for video {}",
                response.status(),
                video_id
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|err| GatewayError::Retrieval(err.to_string()))?;
        Ok(parse_json3_events(&data))
    }
}

#[async_trait]
impl TranscriptProvider for YouTubeTranscriptClient {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptEntry>> {
        let html = self.fetch_watch_html(video_id).await?;
        let api_key = Self::extract_api_key(&html, video_id)?;
        let player = self.fetch_player_response(video_id, &api_key).await?;
        let track_url = Self::select_track_url(&player, video_id)?;

        let entries = self.fetch_track(&track_url, video_id).await?;
        debug!("Fetched {} transcript entries for video {}", entries.len(), video_id);

        if entries.is_empty() {
            return Err(GatewayError::Retrieval(format!(
                "empty transcript for video {}",
                video_id
            )));
        }

        Ok(entries)
    }
}

fn parse_json3_events(data: &Value) -> Vec<TranscriptEntry> {
    let Some(events) = data.get("events").and_then(|e| e.as_array()) else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| {
            let segs = event.get("segs")?.as_array()?;
            let text: String = segs
                .iter()
                .filter_map(|seg| seg.get("utf8").and_then(|t| t.as_str()))
                .collect();
            let text = text.trim().to_string();
            if text.is_empty() {
                return None;
            }

            let start_ms = event.get("tStartMs").and_then(|t| t.as_f64()).unwrap_or(0.0);
            let duration_ms = event.get("dDurationMs").and_then(|d| d.as_f64()).unwrap_or(0.0);

            Some(TranscriptEntry {
                text,
                start: start_ms / 1000.0,
                duration: duration_ms / 1000.0,
            })
        })
        .collect()
}

/// Concatenate entry texts into the single string handed to the summarizer.
pub fn transcript_text(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
