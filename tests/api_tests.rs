use std::sync::Arc;

use anyhow::{Result, anyhow};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use burn::tensor::backend::Backend;
use burn_ndarray::NdArray;
use serde_json::Value;
use tower::ServiceExt;

use burn_lyrics::server::{GenerateResponse, HealthResponse};
use burn_lyrics::tokenizer::{ByteTokenizer, SpecialTokens, Tokenizer};
use burn_lyrics::{
    AppState, GenerationConfig, LyricsGenerator, RecurrentLm, RecurrentLmConfig, router,
};

type InferBackend = NdArray<f32>;

/// Byte vocabulary whose encoder always fails.
struct BrokenEncoder;

impl Tokenizer for BrokenEncoder {
    fn encode(&self, _text: &str) -> Result<Vec<u32>> {
        Err(anyhow!("encoder table is corrupt"))
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        ByteTokenizer::new().decode(ids)
    }

    fn len(&self) -> usize {
        ByteTokenizer::new().len()
    }

    fn special_tokens(&self) -> SpecialTokens {
        ByteTokenizer::new().special_tokens()
    }
}

fn loaded_app() -> Router {
    app_with_tokenizer(Arc::new(ByteTokenizer::new()))
}

fn app_with_tokenizer(tokenizer: Arc<dyn Tokenizer>) -> Router {
    let device = <InferBackend as Backend>::Device::default();
    let config = RecurrentLmConfig {
        vocab_size: tokenizer.len(),
        embed_dim: 8,
        hidden_dim: 16,
        layer_norm_eps: 1e-5,
    };
    let model = RecurrentLm::<InferBackend>::new(&config, &device);
    let generator = LyricsGenerator::new(
        model,
        tokenizer,
        device,
        GenerationConfig {
            max_length: 32,
            temperature: 0.8,
        },
    );
    router(Arc::new(AppState::new(Some(generator))))
}

fn empty_app() -> Router {
    router(Arc::new(AppState::<InferBackend>::new(None)))
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_reports_model_state() {
    for (app, loaded) in [(empty_app(), false), (loaded_app(), true)] {
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse =
            serde_json::from_value(read_json(response).await).expect("health");
        assert_eq!(health.status, "ok");
        assert_eq!(health.model_loaded, loaded);
    }
}

#[tokio::test]
async fn missing_prompt_is_bad_request() {
    for body in ["{}", "not json", "{\"max_length\": 10}"] {
        let response = loaded_app()
            .oneshot(post_json("/generate", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = read_json(response).await;
        assert_eq!(json["error"], "No prompt provided");
    }
}

#[tokio::test]
async fn generate_without_model_is_server_error() {
    let response = empty_app()
        .oneshot(post_json("/generate", "{\"prompt\": \"hello\"}"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = read_json(response).await;
    assert_eq!(json["error"], "Model not loaded properly");
}

#[tokio::test]
async fn generate_returns_raw_and_formatted_text() {
    let response = loaded_app()
        .oneshot(post_json(
            "/generate",
            "{\"prompt\": \"hello\", \"max_length\": 20, \"temperature\": 0.5}",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body: GenerateResponse =
        serde_json::from_value(read_json(response).await).expect("generate response");
    assert_eq!(body.prompt, "hello");
    assert!(body.raw_text.starts_with("hello"));
    assert!(!body.formatted_text.is_empty());
}

#[tokio::test]
async fn invalid_temperature_is_bad_request() {
    let response = loaded_app()
        .oneshot(post_json(
            "/generate",
            "{\"prompt\": \"hello\", \"temperature\": 0}",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mistyped_fields_are_reported_as_such() {
    let cases = [
        ("{\"prompt\": \"hi\", \"temperature\": \"hot\"}", "temperature"),
        ("{\"prompt\": \"hi\", \"max_length\": 10.5}", "max_length"),
        ("{\"prompt\": 42}", "prompt"),
    ];
    for (body, field) in cases {
        let response = loaded_app()
            .oneshot(post_json("/generate", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body}");
        let json = read_json(response).await;
        let message = json["error"].as_str().expect("error message");
        assert_ne!(message, "No prompt provided", "body {body} naming {field}");
        assert!(message.contains("invalid type"), "unexpected message {message:?}");
    }
}

#[tokio::test]
async fn null_prompt_counts_as_missing() {
    for body in ["{\"prompt\": null}", "[\"hello\"]", "\"hello\""] {
        let response = loaded_app()
            .oneshot(post_json("/generate", body))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = read_json(response).await;
        assert_eq!(json["error"], "No prompt provided");
    }
}

#[tokio::test]
async fn negative_max_length_returns_prompt_only() {
    let response = loaded_app()
        .oneshot(post_json(
            "/generate",
            "{\"prompt\": \"hi\", \"max_length\": -1}",
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body: GenerateResponse =
        serde_json::from_value(read_json(response).await).expect("generate response");
    assert_eq!(body.raw_text, "hi");
    assert_eq!(body.formatted_text, "hi");
}

#[tokio::test]
async fn generation_failure_is_server_error() {
    let response = app_with_tokenizer(Arc::new(BrokenEncoder))
        .oneshot(post_json("/generate", "{\"prompt\": \"hello\"}"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = read_json(response).await;
    let message = json["error"].as_str().expect("error message");
    assert!(message.starts_with("Error generating lyrics: "), "{message}");
    assert!(message.contains("encoder table is corrupt"), "{message}");
}

#[tokio::test]
async fn routes_are_mounted_under_api_prefix() {
    let response = loaded_app()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = loaded_app()
        .oneshot(post_json("/api/generate", "{\"prompt\": \"hey\"}"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
