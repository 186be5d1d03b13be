use crate::config::Config;
use crate::photos::{FsObjectStore, PhotoManager, SqliteCatalog};
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use rentpv_common::AgentId;
use rentpv_db::pool::DbPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod routes_photos;

/// Header carrying the acting agent's id.
pub const AGENT_HEADER: &str = "x-agent-id";

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    /// Database connection pool
    pub db_pool: DbPool,
    /// Blob storage for photo files, also served under `/storage`
    pub object_store: Arc<FsObjectStore>,
}

impl AppContext {
    pub fn new(config: Config, db_pool: DbPool) -> Self {
        let object_store = FsObjectStore::new(
            config.storage.objects_dir(),
            config.storage.public_base_url.clone(),
        );
        Self {
            config: Arc::new(config),
            db_pool,
            object_store: Arc::new(object_store),
        }
    }

    /// Photo manager acting on behalf of `agent_id`.
    pub fn photo_manager(&self, agent_id: AgentId) -> PhotoManager {
        let catalog = SqliteCatalog::new(self.db_pool.clone(), agent_id);
        PhotoManager::new(self.object_store.clone(), Arc::new(catalog), agent_id)
            .with_policy(self.config.photos.clone())
            .with_default_bucket(self.config.storage.default_bucket.clone())
    }
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(AGENT_HEADER)]);

    let body_limit = usize::try_from(ctx.config.photos.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    let storage = ServeDir::new(ctx.object_store.root());

    Router::new()
        // Health check
        .route("/health", get(health_check))
        .nest("/api", routes_photos::photo_routes())
        .nest_service("/storage", storage)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Start the HTTP server
pub async fn start_server(config: Config, db_pool: DbPool) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let ctx = AppContext::new(config, db_pool);
    tokio::fs::create_dir_all(ctx.object_store.root())
        .await
        .with_context(|| format!("Failed to create object store at {:?}", ctx.object_store.root()))?;

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
