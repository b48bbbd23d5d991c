use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GatewayError, Result};

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Verify an ID token and return the subject claim of its owner.
    async fn verify(&self, token: &str) -> Result<String>;
}

/// Verifies Google ID tokens against the tokeninfo endpoint. Google checks
/// the signature and expiry; the audience claim must match our client ID.
pub struct GoogleTokenVerifier {
    client: Client,
    client_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    sub: String,
}

impl GoogleTokenVerifier {
    pub fn new(client_id: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()?;

        Ok(Self { client, client_id })
    }

    fn check_audience(&self, info: &TokenInfo) -> Result<String> {
        if info.aud != self.client_id {
            debug!("Token audience mismatch: got {}", info.aud);
            return Err(GatewayError::InvalidToken);
        }

        Ok(info.sub.clone())
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, token: &str) -> Result<String> {
        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|_| GatewayError::InvalidToken)?;

        if !response.status().is_success() {
            debug!("tokeninfo returned {}", response.status());
            return Err(GatewayError::InvalidToken);
        }

        let info: TokenInfo = response.json().await.map_err(|_| GatewayError::InvalidToken)?;

        self.check_audience(&info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verifier() -> GoogleTokenVerifier {
        GoogleTokenVerifier::new("my-client-id.apps.googleusercontent.com".to_string()).unwrap()
    }

    #[test]
    fn test_check_audience_match() {
        let info = TokenInfo {
            aud: "my-client-id.apps.googleusercontent.com".to_string(),
            sub: "10769150350006150715113082367".to_string(),
        };

        assert_eq!(
            verifier().check_audience(&info).unwrap(),
            "10769150350006150715113082367"
        );
    }

    #[test]
    fn test_check_audience_mismatch() {
        let info = TokenInfo {
            aud: "someone-else.apps.googleusercontent.com".to_string(),
            sub: "10769150350006150715113082367".to_string(),
        };

        let err = verifier().check_audience(&info).unwrap_err();
        assert!(matches!(err, GatewayError::InvalidToken));
        assert_eq!(err.to_string(), "Invalid token");
    }

    #[test]
    fn test_tokeninfo_parsing() {
        let raw = r#"{
            "iss": "https://accounts.google.com",
            "aud": "my-client-id.apps.googleusercontent.com",
            "sub": "110169484474386276334",
            "email": "user@example.com",
            "exp": "1433981953"
        }"#;

        let info: TokenInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(info.sub, "110169484474386276334");
    }
}
