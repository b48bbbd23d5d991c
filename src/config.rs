use std::env;

use anyhow::{anyhow, Result};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_address: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub google_client_id: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let openai_api_key =
            env::var("OPENAI_API_KEY").map_err(|_| anyhow!("OPENAI_API_KEY must be set"))?;
        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").map_err(|_| anyhow!("GOOGLE_CLIENT_ID must be set"))?;
        let bind_address = env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let openai_model = env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());

        Ok(Self {
            bind_address,
            openai_api_key,
            openai_model,
            google_client_id,
        })
    }
}
