use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No prompt provided")]
    MissingPrompt,
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Model not loaded properly")]
    ModelNotLoaded,
    #[error("Error generating lyrics: {0}")]
    Generation(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingPrompt | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ModelNotLoaded | ApiError::Generation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
