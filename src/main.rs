mod config;
mod error;
mod models;
mod routes;
mod services;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;
use crate::routes::AppState;
use crate::services::generator::FlashcardGenerator;
use crate::services::llm::LLMClient;
use crate::services::transcript::TranscriptExtractor;
use crate::services::youtube::YouTubeCaptions;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::from_env()?;

    let llm_client = LLMClient::new(config.llm.clone()).context("building LLM client")?;
    let captions = YouTubeCaptions::new(&config.youtube).context("building caption client")?;

    let app_state = AppState {
        generator: Arc::new(FlashcardGenerator::new(Arc::new(llm_client))),
        transcripts: Arc::new(TranscriptExtractor::new(Arc::new(captions))),
    };

    let app = routes::router(app_state).layer(cors_layer(&config.cors_origins)?);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    tracing::info!(
        model = %config.llm.model,
        "Listening on {}",
        listener.local_addr()?
    );
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed = origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("invalid CORS origin {origin:?}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(parsed)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}
