//! HTTP server setup and routing

use crate::audio::MasterVolume;
use crate::engine::{PlaybackSession, VisibilityController};
use crate::error::{Error, Result};
use crate::state::SharedState;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::{Pool, Sqlite};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared application context passed to all handlers.
///
/// AppContext implements Clone, giving us `FromRef<AppContext>` for free
/// via Axum's blanket implementation.
#[derive(Clone)]
pub struct AppContext {
    pub state: Arc<SharedState>,
    pub session: Arc<PlaybackSession>,
    pub visibility: Arc<VisibilityController>,
    pub master_volume: Arc<MasterVolume>,
    pub db_pool: Pool<Sqlite>,
}

/// Build the application router.
pub fn create_router(ctx: AppContext) -> Router {
    Router::new()
        // Health endpoint
        .route("/health", get(super::handlers::health))
        // Playback control
        .route("/playback/select", post(super::handlers::select))
        .route("/playback/toggle", post(super::handlers::toggle))
        .route("/playback/play", post(super::handlers::play))
        .route("/playback/pause", post(super::handlers::pause))
        .route("/playback/stop", post(super::handlers::stop))
        .route("/playback/seek", post(super::handlers::seek))
        .route("/playback/position", get(super::handlers::get_position))
        .route("/playback/state", get(super::handlers::get_state))
        // Volume
        .route("/audio/volume", get(super::handlers::get_volume))
        .route("/audio/volume", post(super::handlers::set_volume))
        // Visibility feed (auto-play on scroll)
        .route("/feed/visibility", post(super::handlers::feed_visibility))
        // SSE event stream
        .route("/events", get(super::sse::event_stream))
        .with_state(ctx)
        // Local UI access
        .layer(CorsLayer::permissive())
}

/// Run the HTTP API server until the task is cancelled.
pub async fn run(port: u16, ctx: AppContext) -> Result<()> {
    let app = create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::Http(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Http(format!("Server error: {}", e)))?;

    Ok(())
}
