mod auth;
mod config;
mod db;
mod errors;
mod jobs;
mod llm_client;
mod models;
mod notifications;
mod routes;
mod scoring;
mod segments;
mod state;
mod store;
mod validation;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::TokenVerifier;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::segments::processing::HttpProcessTrigger;
use crate::state::AppState;
use crate::store::PgStore;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Forge API v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url, config.database_max_connections).await?;
    let store = Arc::new(PgStore::new(pool));

    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
        config.llm_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());

    let processor = HttpProcessTrigger::new(
        config.segments_process_url.clone(),
        config.segments_process_token.clone(),
    )?;
    if config.segments_process_url.is_none() {
        warn!("SEGMENTS_PROCESS_URL is not set; segment processing will not be triggered");
    }

    let verifier = TokenVerifier::new(&config.jwt_secret, &config.jwt_audience);

    let state = AppState {
        store,
        llm: Arc::new(llm),
        processor: Arc::new(processor),
        verifier: Arc::new(verifier),
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
