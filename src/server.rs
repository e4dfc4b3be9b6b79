//! Server wiring and lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use ghostflow_api::{create_router, AppState};
use ghostflow_provider_http::{HttpLlmProvider, HttpProviderConfig, RetryConfig, RetryProvider};
use ghostflow_store::MemoryStore;

use crate::config::Config;

/// Initialize tracing with env-filtered console output.
pub(crate) fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the state, bind, and serve until ctrl-c.
pub(crate) async fn run_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(MemoryStore::new());

    let http_provider = HttpLlmProvider::new(HttpProviderConfig::new(
        &config.llm.base_url,
        config.llm_api_key(),
        &config.llm.model,
    ));
    let provider = Arc::new(RetryProvider::new(
        Arc::new(http_provider),
        RetryConfig::default(),
    ));

    let state = Arc::new(
        AppState::new(store, provider).with_rate_limit(config.ingest.per_device_rate_limit),
    );
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Ghostflow server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
