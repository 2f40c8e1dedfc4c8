mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod onboarding;
mod policy;
mod routes;
mod screening;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, EmbeddingProvider};
use crate::db::{create_pool, ensure_schema};
use crate::llm_client::LlmClient;
use crate::onboarding::generator::OnboardingPlanner;
use crate::policy::assistant::PolicyAssistant;
use crate::policy::embedding::{Embedder, HashingEmbedder, HttpEmbedder};
use crate::routes::build_router;
use crate::screening::extractor::ResumeExtractor;
use crate::state::AppState;
use crate::store::PgStore;

/// How often idle sessions are swept.
const SESSION_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting hrdesk API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    let store = Arc::new(PgStore::new(db, s3, config.s3_bucket.clone()));

    // Initialize LLM client
    let llm = Arc::new(
        LlmClient::new(config.anthropic_api_key.clone(), &config.llm)
            .context("failed to build LLM client")?,
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize embedding backend
    let embedder: Arc<dyn Embedder> = match config.embedding.provider {
        EmbeddingProvider::Http => Arc::new(
            HttpEmbedder::new(&config.embedding, &config.llm)
                .context("failed to build embedding client")?,
        ),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(config.embedding.dimension)),
    };
    info!(
        "Embedding backend: {:?} ({} dims)",
        config.embedding.provider,
        embedder.dimension()
    );

    // Initialize the policy engine
    let policy = Arc::new(PolicyAssistant::new(
        llm.clone(),
        config.rag.clone(),
        config.llm.temperature,
    ));
    policy
        .init(embedder)
        .await
        .context("failed to initialize policy engine")?;
    let pruner = policy.sessions().spawn_pruner(SESSION_PRUNE_INTERVAL);

    // Build app state
    let state = AppState {
        config: config.clone(),
        extractor: ResumeExtractor::new(llm.clone()),
        onboarding: OnboardingPlanner::new(llm),
        policy: policy.clone(),
        store,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped, shutting down policy engine");
    pruner.abort();
    if let Err(e) = policy.shutdown().await {
        error!("Policy engine shutdown failed: {e}");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hrdesk-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
