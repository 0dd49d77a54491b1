mod error;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

pub use error::ApiError;

use crate::generation::GenerationSettings;
use crate::inference::LyricsGenerator;

/// Router state. `generator` is `None` when the checkpoint failed to load.
pub struct AppState<B: Backend> {
    generator: Option<Arc<LyricsGenerator<B>>>,
}

impl<B: Backend> AppState<B> {
    pub fn new(generator: Option<LyricsGenerator<B>>) -> Self {
        Self {
            generator: generator.map(Arc::new),
        }
    }

    pub fn model_loaded(&self) -> bool {
        self.generator.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
}

/// Body of `POST /generate`. A negative `max_length` means no new tokens. A
/// non-positive or non-finite `temperature` is rejected with 400 before sampling.
#[derive(Debug, Deserialize)]
struct GenerateRequest {
    prompt: String,
    max_length: Option<i64>,
    temperature: Option<f32>,
}

impl GenerateRequest {
    /// Anything that is not an object carrying a non-null `prompt` counts as a
    /// missing prompt; badly typed fields are reported with the serde message.
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body).map_err(|err| {
            warn!("rejecting generate request: {err}");
            ApiError::MissingPrompt
        })?;
        match value.get("prompt") {
            Some(prompt) if !prompt.is_null() => {}
            _ => return Err(ApiError::MissingPrompt),
        }
        serde_json::from_value(value).map_err(|err| {
            warn!("rejecting generate request: {err}");
            ApiError::InvalidRequest(err.to_string())
        })
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateResponse {
    pub prompt: String,
    pub raw_text: String,
    pub formatted_text: String,
}

/// `/health` and `/generate`, served at the root and under `/api`.
pub fn router<B: Backend>(state: Arc<AppState<B>>) -> Router {
    let routes = Router::new()
        .route("/health", get(health::<B>))
        .route("/generate", post(generate::<B>));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health<B: Backend>(State(state): State<Arc<AppState<B>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: state.model_loaded(),
    })
}

async fn generate<B: Backend>(
    State(state): State<Arc<AppState<B>>>,
    body: Bytes,
) -> Result<Json<GenerateResponse>, ApiError> {
    let request = GenerateRequest::parse(&body)?;
    let prompt = request.prompt;

    let generator = state.generator.clone().ok_or(ApiError::ModelNotLoaded)?;
    let defaults = generator.defaults();
    let settings = GenerationSettings {
        max_length: request
            .max_length
            .map_or(defaults.max_length, |len| usize::try_from(len).unwrap_or(0)),
        temperature: request.temperature.unwrap_or(defaults.temperature),
    };
    settings
        .validate()
        .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;

    let task_prompt = prompt.clone();
    let lyrics = tokio::task::spawn_blocking(move || generator.generate(&task_prompt, settings))
        .await
        .map_err(|err| {
            error!("generation task failed: {err}");
            ApiError::Generation(err.to_string())
        })?
        .map_err(|err| {
            error!("generation failed: {err:#}");
            ApiError::Generation(format!("{err:#}"))
        })?;

    Ok(Json(GenerateResponse {
        prompt,
        raw_text: lyrics.raw_text,
        formatted_text: lyrics.formatted_text,
    }))
}
