//! HTTP request handlers

use crate::api::server::AppContext;
use crate::db;
use crate::error::Error;
use axum::{extract::State, http::StatusCode, Json};
use segue_common::Clip;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    position_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    clip_id: Option<Uuid>,
    position_ms: u64,
    duration_ms: u64,
    progress: f64,
    state: String,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    state: String,
}

#[derive(Debug, Deserialize)]
pub struct VolumeRequest {
    /// 0-100 user-facing scale
    volume: u8,
}

#[derive(Debug, Serialize)]
pub struct VolumeResponse {
    volume: u8,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityRequest {
    item_id: Uuid,
    ratio: f32,
    clip: Clip,
}

#[derive(Debug, Serialize)]
pub struct VisibilityResponse {
    switched: bool,
}

type HandlerError = (StatusCode, String);

/// Map engine errors onto HTTP status codes.
fn map_error(e: Error) -> HandlerError {
    let status = match &e {
        Error::SourceUnavailable(_) => StatusCode::BAD_GATEWAY,
        Error::BadRequest(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string())
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "segue-player".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Playback control
// ============================================================================

/// POST /playback/select - bind a clip and start looping it
pub async fn select(
    State(ctx): State<AppContext>,
    Json(clip): Json<Clip>,
) -> Result<Json<StatusResponse>, HandlerError> {
    info!("Select request: {}", clip.clip_id);
    ctx.session.select(clip).await.map_err(map_error)?;
    Ok(Json(StatusResponse {
        status: "playing".to_string(),
    }))
}

/// POST /playback/toggle - start / pause / resume depending on session state
pub async fn toggle(
    State(ctx): State<AppContext>,
    Json(clip): Json<Clip>,
) -> Result<Json<StateResponse>, HandlerError> {
    info!("Toggle request: {}", clip.clip_id);
    ctx.session.toggle(clip).await.map_err(map_error)?;
    Ok(Json(StateResponse {
        state: ctx.state.engine_state().await.as_str().to_string(),
    }))
}

/// POST /playback/play - resume from pause
pub async fn play(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.resume().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /playback/pause
pub async fn pause(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.pause().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /playback/stop
pub async fn stop(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    ctx.session.stop().await;
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}

/// POST /playback/seek
pub async fn seek(
    State(ctx): State<AppContext>,
    Json(request): Json<SeekRequest>,
) -> Result<Json<StatusResponse>, HandlerError> {
    if !request.position_seconds.is_finite() || request.position_seconds < 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Invalid seek position: {}", request.position_seconds),
        ));
    }
    ctx.session.seek(request.position_seconds).await;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

/// GET /playback/position
pub async fn get_position(State(ctx): State<AppContext>) -> Json<PositionResponse> {
    let readout = ctx.state.current_clip().await;
    let state = ctx.state.engine_state().await;

    Json(PositionResponse {
        clip_id: readout.as_ref().map(|r| r.clip_id),
        position_ms: readout.as_ref().map(|r| r.position_ms).unwrap_or(0),
        duration_ms: readout.as_ref().map(|r| r.duration_ms).unwrap_or(0),
        progress: ctx.session.progress_fraction(),
        state: state.as_str().to_string(),
    })
}

/// GET /playback/state
pub async fn get_state(State(ctx): State<AppContext>) -> Json<StateResponse> {
    Json(StateResponse {
        state: ctx.state.engine_state().await.as_str().to_string(),
    })
}

// ============================================================================
// Volume
// ============================================================================

/// GET /audio/volume
pub async fn get_volume(State(ctx): State<AppContext>) -> Json<VolumeResponse> {
    let volume = ctx.state.volume().await;
    Json(VolumeResponse {
        volume: (volume * 100.0).round() as u8,
    })
}

/// POST /audio/volume - set master volume, persisted to settings
pub async fn set_volume(
    State(ctx): State<AppContext>,
    Json(request): Json<VolumeRequest>,
) -> Result<Json<VolumeResponse>, HandlerError> {
    if request.volume > 100 {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Volume {} out of range 0-100", request.volume),
        ));
    }

    let volume = request.volume as f32 / 100.0;
    ctx.master_volume.set(volume);
    ctx.state.set_volume(volume).await;

    if let Err(e) = db::settings::set_volume(&ctx.db_pool, volume).await {
        error!("Failed to persist volume: {}", e);
    }

    Ok(Json(VolumeResponse {
        volume: request.volume,
    }))
}

// ============================================================================
// Visibility feed
// ============================================================================

/// POST /feed/visibility - one visibility change event for a feed item
pub async fn feed_visibility(
    State(ctx): State<AppContext>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<VisibilityResponse>, HandlerError> {
    let switched = ctx
        .visibility
        .observe(request.item_id, request.clip, request.ratio)
        .await
        .map_err(map_error)?;

    Ok(Json(VisibilityResponse { switched }))
}
