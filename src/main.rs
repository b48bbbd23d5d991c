use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::AppConfig;
use crate::summarize::OpenAiSummarizer;
use crate::transcript::YouTubeTranscriptClient;
use crate::verify::GoogleTokenVerifier;

mod api;
mod batch;
mod config;
mod error;
mod extract;
mod summarize;
mod transcript;
mod verify;

#[derive(Parser)]
#[command(name = "transcript-gateway")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => serve(bind).await,
    }
}

async fn serve(bind: Option<String>) -> Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(bind) = bind {
        config.bind_address = bind;
    }

    let transcripts = YouTubeTranscriptClient::new()?;
    let summarizer = OpenAiSummarizer::new(config.openai_api_key.clone(), config.openai_model.clone())?;
    let verifier = GoogleTokenVerifier::new(config.google_client_id.clone())?;

    let state = AppState::new(Arc::new(transcripts), Arc::new(summarizer), Arc::new(verifier));
    let app = api::router(state);

    let addr: SocketAddr = config.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Transcript gateway listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
