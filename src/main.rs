use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

use acquisitions_query::api;
use acquisitions_query::api::handlers::AppState;
use acquisitions_query::config::Config;
use acquisitions_query::services::database::StoreProvider;
use acquisitions_query::services::{build_schema, NlQueryService, OpenAiModel, SharedPool};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration first so the log level can come from it
    let config = Config::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&config.logging.level)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting server on {}", config.server_address());

    let pool = Arc::new(SharedPool::new(&config.database));
    // Warm the pool; a failure here is retried by the first request
    if let Err(e) = pool.get().await {
        warn!("Database not ready at startup: {}", e);
    } else {
        info!("DB initialized, starting server");
    }

    if config.llm.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set; natural-language queries will fail");
    }

    let provider: Arc<dyn StoreProvider> = pool;
    let schema = build_schema();
    let nl_service = Arc::new(NlQueryService::new(
        Arc::new(OpenAiModel::new(&config)),
        provider.clone(),
        schema.clone(),
    ));

    // Create router with state
    let app: Router = api::routes::create_router(AppState::new(schema, provider, nl_service));

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    info!("GraphQL ready at http://{}/v1/acquisitions", addr);
    info!("LLM ready at http://{}/v1/llm/acquisitions", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", addr, e);
        e
    })?;
    axum::serve(listener, app).await?;

    Ok(())
}
