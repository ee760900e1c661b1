use crate::config::Config;
use crate::engine::ManifestEngine;
use crate::http::build_client;
use crate::queue::ConversionQueue;
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderMap, Method},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes;

/// Shared application context
#[derive(Clone)]
pub struct ServerContext {
    pub engine: Arc<ManifestEngine>,
    /// Configured public base URL; derived per request when unset
    pub base_url: Option<String>,
}

impl ServerContext {
    pub fn new(engine: Arc<ManifestEngine>, base_url: Option<String>) -> Self {
        Self { engine, base_url }
    }

    pub fn base_url(&self, headers: &HeaderMap) -> String {
        match &self.base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => routes::request_base_url(headers),
        }
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: ServerContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(routes::health_check))
        .route("/", get(routes::resolve))
        .route("/*path", get(routes::manifest))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let client = build_client(&config.providers).context("Failed to build HTTP client")?;
    let queue = ConversionQueue::new(client, config.image_service.queue_url.clone());
    let engine = ManifestEngine::from_config(&config, queue).context("Failed to build manifest engine")?;
    let ctx = ServerContext::new(Arc::new(engine), config.server.base_url.clone());

    let app = create_router(ctx);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
