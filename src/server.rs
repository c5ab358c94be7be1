use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::Html,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    config::AppConfig,
    error::ServiceError,
    model::{
        CATALOG, CatalogEntry, GenerationBackend, ModelInfo, ModelRegistry, OptimizationLevel,
        OptimizationPreset, QueueStatus,
    },
    story::{GenerationRequest, RawGenerationRequest, validate},
};

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub registry: Arc<ModelRegistry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub story: String,
    pub status: String,
    pub backend: GenerationBackend,
    pub elapsed_ms: u64,
    pub parameters: GenerationRequest,
    pub model_info: ModelInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_info: ModelInfo,
    pub queue: QueueStatus,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub available_models: &'static [CatalogEntry],
    pub current_model: String,
}

#[derive(Debug, Deserialize)]
pub struct SwitchModelRequest {
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SwitchModelResponse {
    pub message: String,
    pub model_info: ModelInfo,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct OptimizeRequest {
    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub message: String,
    pub level: OptimizationLevel,
    pub optimizations: OptimizationPreset,
    pub note: &'static str,
}

pub fn build_router(config: Arc<AppConfig>, registry: Arc<ModelRegistry>) -> Router {
    let state = AppState { config, registry };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/generate", post(generate_story))
        .route("/api/models", get(list_models))
        .route("/api/switch-model", post(switch_model))
        .route("/api/optimize", post(optimize))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let model_info = state.registry.model_info();
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: model_info.loaded,
        model_info,
        queue: state.registry.queue_status(),
    })
}

async fn generate_story(
    State(state): State<AppState>,
    payload: Result<Json<RawGenerationRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ServiceError> {
    let Json(raw) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    let request = validate(&raw)?;

    let result = state.registry.generate(&request).await?;
    info!(
        genre = request.genre.as_str(),
        length = request.length.as_str(),
        backend = result.backend.as_str(),
        elapsed_ms = result.elapsed_ms,
        "story generated"
    );

    Ok(Json(GenerateResponse {
        story: result.story,
        status: "success".to_string(),
        backend: result.backend,
        elapsed_ms: result.elapsed_ms,
        parameters: request,
        model_info: state.registry.model_info(),
    }))
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        available_models: CATALOG,
        current_model: state.registry.current().model_name().to_string(),
    })
}

async fn switch_model(
    State(state): State<AppState>,
    payload: Result<Json<SwitchModelRequest>, JsonRejection>,
) -> Result<Json<SwitchModelResponse>, ServiceError> {
    let Json(body) = payload.map_err(|rejection| ServiceError::BadRequest(rejection.body_text()))?;
    let model_name = body
        .model_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ServiceError::BadRequest("model_name is required".into()))?;

    info!(model = %model_name, "switching model");
    let model_info = state
        .registry
        .switch_model(&model_name, state.config.clone())
        .await?;

    Ok(Json(SwitchModelResponse {
        message: format!("Switched to {model_name}"),
        success: model_info.loaded,
        model_info,
    }))
}

async fn optimize(
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Json<OptimizeResponse> {
    let requested = payload.ok().and_then(|Json(body)| body.level);
    let level = OptimizationLevel::parse_lenient(requested.as_deref());

    Json(OptimizeResponse {
        message: format!("Optimization level set to {}", level.as_str()),
        level,
        optimizations: level.preset(),
        note: "Restart the service to apply optimizations",
    })
}
