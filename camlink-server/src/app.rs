use crate::config::RelayConfig;
use crate::http::{control_start, control_stop, list_videos, relay_status, upload_video};
use crate::registry::ConnectionRegistry;
use crate::routing::MessageRouter;
use crate::signaling::relay_socket;
use crate::storage::RecordingStore;
use anyhow::Context;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared state behind every relay handler.
pub struct AppState {
    pub config: RelayConfig,
    pub registry: ConnectionRegistry,
    pub router: MessageRouter,
    pub store: RecordingStore,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Self {
        let registry = ConnectionRegistry::new(config.outbound_queue_capacity);
        let router = MessageRouter::new(registry.clone(), config.min_frame_bytes);
        let store = RecordingStore::new(&config.upload_dir, config.video_extensions.clone());

        Self {
            config,
            registry,
            router,
            store,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.store.dir());

    Router::new()
        .route("/control/start", post(control_start))
        .route("/control/stop", post(control_stop))
        .route("/upload", post(upload_video))
        .route("/videos", get(list_videos))
        .route("/status", get(relay_status))
        .nest_service("/uploads", uploads)
        .fallback(relay_socket)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// A bound, not yet running relay.
pub struct RelayServer {
    listener: TcpListener,
    state: Arc<AppState>,
}

impl RelayServer {
    pub async fn bind(config: RelayConfig) -> anyhow::Result<Self> {
        let state = Arc::new(AppState::new(config));
        state
            .store
            .ensure_dir()
            .await
            .with_context(|| format!("creating {}", state.store.dir().display()))?;

        let listener = TcpListener::bind(state.config.bind_addr)
            .await
            .with_context(|| format!("binding {}", state.config.bind_addr))?;

        Ok(Self { listener, state })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.local_addr()?;
        info!("Relay listening on {}", addr);
        info!("  camera:  ws://{}/camera", addr);
        info!("  viewer:  ws://{}/viewer", addr);
        info!("  uploads: {}", self.state.store.dir().display());

        let app = build_router(self.state);
        axum::serve(self.listener, app)
            .await
            .context("relay server stopped")?;
        Ok(())
    }
}

/// Binds and runs a relay until the process is stopped.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    RelayServer::bind(config).await?.run().await
}
