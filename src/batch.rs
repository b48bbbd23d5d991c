use serde::Serialize;
use tracing::debug;

use crate::extract::extract_video_id;
use crate::transcript::{TranscriptEntry, TranscriptProvider};

/// Outcome for one URL in a batch: either an identifier with its transcript,
/// or a null identifier with the failure message.
#[derive(Debug, Serialize)]
pub struct BatchItem {
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<TranscriptEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchItem {
    fn success(video_id: String, transcript: Vec<TranscriptEntry>) -> Self {
        Self {
            video_id: Some(video_id),
            transcript: Some(transcript),
            error: None,
        }
    }

    fn failure(message: String) -> Self {
        Self {
            video_id: None,
            transcript: None,
            error: Some(message),
        }
    }
}

/// Process each URL in sequence, one output record per input, same order.
/// A failed item is reported inline and never aborts the rest of the batch;
/// when extraction fails the transcript call for that item is skipped.
pub async fn run_batch(provider: &dyn TranscriptProvider, urls: &[String]) -> Vec<BatchItem> {
    let mut results = Vec::with_capacity(urls.len());

    for url in urls {
        let item = match extract_video_id(url) {
            Ok(video_id) => match provider.fetch_transcript(&video_id).await {
                Ok(transcript) => BatchItem::success(video_id, transcript),
                Err(err) => {
                    debug!("Batch item failed for video {}: {}", video_id, err);
                    BatchItem::failure(err.to_string())
                }
            },
            Err(err) => BatchItem::failure(err.to_string()),
        };

        results.push(item);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GatewayError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubProvider {
        calls: AtomicUsize,
        fail_for: Option<String>,
    }

    impl StubProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for: None,
            }
        }

        fn failing_for(video_id: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_for: Some(video_id.to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl TranscriptProvider for StubProvider {
        async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptEntry>> {
            self.calls.fetch_add(1, Ordering::Relaxed);

            if self.fail_for.as_deref() == Some(video_id) {
                return Err(GatewayError::Retrieval(format!(
                    "no caption tracks for video {}",
                    video_id
                )));
            }

            Ok(vec![TranscriptEntry {
                text: format!("transcript for {}", video_id),
                start: 0.0,
                duration: 1.0,
            }])
        }
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider = StubProvider::new();
        let results = run_batch(&provider, &[]).await;
        assert!(results.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_url_skips_transcript_call() {
        let provider = StubProvider::new();
        let urls = vec![
            "https://youtu.be/dQw4w9WgXcQ".to_string(),
            "not a url".to_string(),
        ];

        let results = run_batch(&provider, &urls).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].video_id.as_deref(), Some("dQw4w9WgXcQ"));
        assert!(results[0].transcript.is_some());
        assert!(results[0].error.is_none());

        assert_eq!(results[1].video_id, None);
        assert_eq!(results[1].error.as_deref(), Some("Invalid YouTube URL"));
        assert!(results[1].transcript.is_none());

        // Only the valid URL reached the provider.
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_isolated() {
        let provider = StubProvider::failing_for("AAAAAAAAAAA");
        let urls = vec![
            "https://youtu.be/AAAAAAAAAAA".to_string(),
            "https://youtu.be/BBBBBBBBBBB".to_string(),
        ];

        let results = run_batch(&provider, &urls).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].video_id, None);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("no caption tracks"));
        assert_eq!(results[1].video_id.as_deref(), Some("BBBBBBBBBBB"));
    }

    #[tokio::test]
    async fn test_order_preserved_with_mixed_failures() {
        let provider = StubProvider::new();
        let urls = vec![
            "bad one".to_string(),
            "https://www.youtube.com/watch?v=CCCCCCCCCCC".to_string(),
            "bad two".to_string(),
            "https://youtu.be/DDDDDDDDDDD".to_string(),
        ];

        let results = run_batch(&provider, &urls).await;

        assert_eq!(results.len(), 4);
        let ids: Vec<Option<&str>> = results.iter().map(|r| r.video_id.as_deref()).collect();
        assert_eq!(
            ids,
            vec![None, Some("CCCCCCCCCCC"), None, Some("DDDDDDDDDDD")]
        );
        assert_eq!(results.iter().filter(|r| r.video_id.is_none()).count(), 2);
    }

    #[test]
    fn test_batch_item_serialization() {
        let ok = BatchItem::success(
            "dQw4w9WgXcQ".to_string(),
            vec![TranscriptEntry {
                text: "hi".to_string(),
                start: 0.0,
                duration: 1.0,
            }],
        );
        let value = serde_json::to_value(&ok).unwrap();
        assert_eq!(value["video_id"], "dQw4w9WgXcQ");
        assert!(value.get("error").is_none());

        let failed = BatchItem::failure("Invalid YouTube URL".to_string());
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["video_id"], serde_json::Value::Null);
        assert_eq!(value["error"], "Invalid YouTube URL");
        assert!(value.get("transcript").is_none());
    }
}
