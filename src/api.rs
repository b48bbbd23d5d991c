use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::batch::{run_batch, BatchItem};
use crate::error::GatewayError;
use crate::extract::extract_video_id;
use crate::summarize::Summarizer;
use crate::transcript::{transcript_text, TranscriptEntry, TranscriptProvider};
use crate::verify::TokenVerifier;

#[derive(Clone)]
pub struct AppState {
    transcripts: Arc<dyn TranscriptProvider>,
    summarizer: Arc<dyn Summarizer>,
    verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(
        transcripts: Arc<dyn TranscriptProvider>,
        summarizer: Arc<dyn Summarizer>,
        verifier: Arc<dyn TokenVerifier>,
    ) -> Self {
        Self {
            transcripts,
            summarizer,
            verifier,
        }
    }
}

pub fn router(state: AppState) -> Router {
    // The frontend is served from another origin, so mirror the permissive
    // CORS policy the service has always had.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health))
        .route("/transcript", post(transcript))
        .route("/batch", post(batch))
        .route("/summarize", post(summarize))
        .route("/verify-token", post(verify_token))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

async fn transcript(
    State(state): State<AppState>,
    Json(request): Json<VideoUrlRequest>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let video_id = extract_video_id(&request.url)?;
    let transcript = state.transcripts.fetch_transcript(&video_id).await?;

    Ok(Json(TranscriptResponse {
        video_id,
        transcript,
    }))
}

async fn batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Json<Vec<BatchItem>> {
    info!("Processing batch of {} URLs", request.urls.len());
    let results = run_batch(state.transcripts.as_ref(), &request.urls).await;
    Json(results)
}

async fn summarize(
    State(state): State<AppState>,
    Json(request): Json<VideoUrlRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let video_id = extract_video_id(&request.url)?;
    let transcript = state.transcripts.fetch_transcript(&video_id).await?;
    let summary = state.summarizer.summarize(&transcript_text(&transcript)).await?;

    Ok(Json(SummaryResponse { video_id, summary }))
}

async fn verify_token(
    State(state): State<AppState>,
    Json(request): Json<TokenRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let userid = state.verifier.verify(&request.token).await?;

    Ok(Json(VerifyResponse {
        status: "success".to_string(),
        userid,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VideoUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub video_id: String,
    pub transcript: Vec<TranscriptEntry>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub video_id: String,
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: String,
    pub userid: String,
}

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] GatewayError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Each error kind maps to a fixed status; nothing falls through to a
        // catch-all client error.
        let status = match self.0 {
            GatewayError::InvalidUrl
            | GatewayError::InvalidToken
            | GatewayError::Retrieval(_)
            | GatewayError::Summarization(_) => StatusCode::BAD_REQUEST,
            GatewayError::Http(_) => StatusCode::BAD_GATEWAY,
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));

        (status, body).into_response()
    }
}
