//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use super::handlers;
use super::models::{
    status_for, AnalyzeRequest, ApiResponse, ConvertRequest, EditRequest, HookRequest, LongFormRequest,
    RefineRequest,
};
use crate::config::Config;
use crate::error::StudioError;
use crate::studio::Studio;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<Studio>,
    pub config: Arc<Config>,
}

/// Build the router with every endpoint
pub fn router(state: AppState) -> Router {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        // Full-script workflow
        .route("/api/session", get(session_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/topics/:id/script", post(select_topic_handler))
        .route("/api/script/refine", post(refine_script_handler))
        .route("/api/script/edit", post(edit_script_handler))
        .route("/api/script/versions/:index/select", post(select_script_version_handler))
        .route("/api/script/export", get(export_script_handler))
        .route("/api/back", post(back_handler))
        .route("/api/reset", post(reset_handler))
        // Short-form conversion
        .route("/api/shorts", get(list_conversions_handler).post(convert_handler))
        .route(
            "/api/shorts/:id",
            get(get_conversion_handler).delete(remove_conversion_handler),
        )
        .route("/api/shorts/:id/select/:index", post(select_recommendation_handler))
        .route("/api/shorts/:id/refine", post(refine_short_handler))
        .route("/api/shorts/:id/edit", post(edit_short_handler))
        .route("/api/shorts/:id/versions/:index/select", post(select_short_version_handler))
        .route("/api/shorts/:id/export", get(export_short_handler))
        // Stand-alone generators
        .route("/api/hook", post(hook_handler))
        .route("/api/long-form", post(long_form_handler));

    let enable_cors = state.config.server.enable_cors;
    let app = app.with_state(state).layer(TraceLayer::new_for_http());

    if enable_cors {
        // Configure CORS to allow browser access
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]);
        app.layer(ServiceBuilder::new().layer(cors))
    } else {
        app
    }
}

/// Configure and start the HTTP server
pub async fn start_http_server(studio: Arc<Studio>, config: Arc<Config>) -> Result<()> {
    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = router(AppState { studio, config });

    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn respond<T: Serialize>(result: crate::error::Result<T>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: StudioError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        warn!("Request failed: {}", err);
    }
    (status, Json(ApiResponse::<()>::error(err.user_message()))).into_response()
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check(&state.studio).await))
}

async fn session_handler(State(state): State<AppState>) -> Response {
    respond(Ok(handlers::session(&state.studio).await))
}

async fn analyze_handler(State(state): State<AppState>, Json(payload): Json<AnalyzeRequest>) -> Response {
    respond(handlers::analyze(&state.studio, &payload.script).await)
}

async fn select_topic_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    respond(handlers::select_topic(&state.studio, id).await)
}

async fn refine_script_handler(State(state): State<AppState>, Json(payload): Json<RefineRequest>) -> Response {
    respond(handlers::refine_script(&state.studio, &payload.instruction).await)
}

async fn edit_script_handler(State(state): State<AppState>, Json(payload): Json<EditRequest>) -> Response {
    respond(handlers::edit_script(&state.studio, &payload.content).await)
}

async fn select_script_version_handler(State(state): State<AppState>, Path(index): Path<usize>) -> Response {
    respond(handlers::select_script_version(&state.studio, index).await)
}

async fn export_script_handler(State(state): State<AppState>) -> Response {
    respond(handlers::export_script(&state.studio).await)
}

async fn back_handler(State(state): State<AppState>) -> Response {
    respond(handlers::back(&state.studio).await)
}

async fn reset_handler(State(state): State<AppState>) -> Response {
    respond(Ok(handlers::reset(&state.studio).await))
}

async fn list_conversions_handler(State(state): State<AppState>) -> Response {
    respond(Ok(handlers::list_conversions(&state.studio).await))
}

async fn convert_handler(State(state): State<AppState>, Json(payload): Json<ConvertRequest>) -> Response {
    respond(handlers::convert(&state.studio, payload).await)
}

async fn get_conversion_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    respond(handlers::get_conversion(&state.studio, id).await)
}

async fn remove_conversion_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    respond(handlers::remove_conversion(&state.studio, id).await)
}

async fn select_recommendation_handler(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
) -> Response {
    respond(handlers::select_recommendation(&state.studio, id, index).await)
}

async fn refine_short_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<RefineRequest>,
) -> Response {
    respond(handlers::refine_short(&state.studio, id, &payload.instruction).await)
}

async fn edit_short_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(payload): Json<EditRequest>,
) -> Response {
    respond(handlers::edit_short(&state.studio, id, &payload.content).await)
}

async fn select_short_version_handler(
    State(state): State<AppState>,
    Path((id, index)): Path<(u64, usize)>,
) -> Response {
    respond(handlers::select_short_version(&state.studio, id, index).await)
}

async fn export_short_handler(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    respond(handlers::export_short(&state.studio, id).await)
}

async fn hook_handler(State(state): State<AppState>, Json(payload): Json<HookRequest>) -> Response {
    respond(handlers::hook_script(&state.studio, payload).await)
}

async fn long_form_handler(State(state): State<AppState>, Json(payload): Json<LongFormRequest>) -> Response {
    respond(handlers::long_form(&state.studio, &payload.topic).await)
}
