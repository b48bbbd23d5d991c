use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid YouTube URL")]
    InvalidUrl,

    #[error("Invalid token")]
    InvalidToken,

    #[error("transcript retrieval failed: {0}")]
    Retrieval(String),

    #[error("summarization failed: {0}")]
    Summarization(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
