use crate::error::ApiError;
use crate::sse::dialog_sse;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use colloquy_session::{DialogConfig, DialogSnapshot, SessionRegistry};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::info;

/// Shared application state.
pub struct AppState {
    pub sessions: Arc<SessionRegistry>,
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub config: DialogConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct InterveneRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusResponse {
    fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PauseResponse {
    pub paused: bool,
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the API router without a static front end.
    pub fn build(sessions: Arc<SessionRegistry>) -> Router {
        Self::build_with_static(sessions, None)
    }

    /// Build the API router, serving `static_dir` for every other path when set.
    pub fn build_with_static(sessions: Arc<SessionRegistry>, static_dir: Option<PathBuf>) -> Router {
        let state = Arc::new(AppState { sessions });

        let mut app = Router::new()
            .route("/health", get(health_handler))
            .route("/api/dialog/start", post(start_dialog))
            .route("/api/dialog/{id}/stream", get(stream_dialog))
            .route("/api/dialog/{id}/intervene", post(intervene))
            .route("/api/dialog/{id}/pause", post(toggle_pause))
            .route("/api/dialog/{id}/state", get(dialog_state))
            .route("/api/dialog/{id}", delete(delete_dialog))
            .with_state(state);

        if let Some(dir) = static_dir {
            info!(dir = %dir.display(), "Serving static front end");
            app = app.fallback_service(ServeDir::new(dir));
        }

        app.layer(CorsLayer::permissive())
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": "colloquy"}))
}

async fn start_dialog(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let session_id = state.sessions.create(req.config).await?;
    Ok(Json(StartResponse { session_id }))
}

async fn stream_dialog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let engine = state.sessions.get(&id).await?;
    info!(session_id = %id, "Event stream opened");
    Ok(dialog_sse(engine.stream()).into_response())
}

async fn intervene(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InterveneRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let engine = state.sessions.get(&id).await?;
    engine.inject(&req.message)?;
    info!(session_id = %id, "Moderator message injected");
    Ok(Json(StatusResponse {
        message: Some("Message was injected.".to_string()),
        ..StatusResponse::ok()
    }))
}

async fn toggle_pause(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PauseResponse>, ApiError> {
    let paused = state.sessions.get(&id).await?.toggle_pause();
    info!(session_id = %id, paused, "Pause toggled");
    Ok(Json(PauseResponse { paused }))
}

async fn dialog_state(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DialogSnapshot>, ApiError> {
    Ok(Json(state.sessions.get(&id).await?.snapshot()))
}

async fn delete_dialog(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.sessions.remove(&id).await?;
    Ok(Json(StatusResponse::ok()))
}
