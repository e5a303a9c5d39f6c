//! Integration tests for the Ollama-compatible endpoints.
//!
//! Uses a mock runtime so the router can be exercised without a GGUF file.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use llamashim_core::Config;
use llamashim_daemon::{app, AppState, RuntimeFactory};
use llamashim_runtime_api::{
    CompletionRequest, CompletionResponse, FinishReason, Runtime, RuntimeConfig, RuntimeStatus,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

// ---------------------------------------------------------------------------
// MockRuntime — canned reply, records what the handlers sent
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Recorder {
    loads: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Recorder {
    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

struct MockRuntime {
    recorder: Recorder,
    reply: Result<String, String>,
    fail_load: bool,
    status: RuntimeStatus,
}

#[async_trait]
impl Runtime for MockRuntime {
    fn status(&self) -> RuntimeStatus {
        self.status
    }

    async fn load(&mut self, config: RuntimeConfig) -> Result<()> {
        self.recorder.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            anyhow::bail!("Model path does not exist: {}", config.model_path.display());
        }
        self.status = RuntimeStatus::Ready;
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        self.status = RuntimeStatus::Unloaded;
        Ok(())
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.recorder.requests.lock().unwrap().push(request);
        match &self.reply {
            Ok(text) => Ok(CompletionResponse {
                text: text.clone(),
                prompt_tokens: 3,
                completion_tokens: 2,
                finish_reason: FinishReason::Stop,
            }),
            Err(message) => anyhow::bail!("{}", message),
        }
    }
}

struct TestApp {
    router: Router,
    recorder: Recorder,
}

fn test_app_with(config: Config, reply: Result<&str, &str>, fail_load: bool) -> TestApp {
    let recorder = Recorder::default();
    let reply = reply.map(str::to_string).map_err(str::to_string);

    let factory_recorder = recorder.clone();
    let factory: RuntimeFactory = Arc::new(move || {
        Box::new(MockRuntime {
            recorder: factory_recorder.clone(),
            reply: reply.clone(),
            fail_load,
            status: RuntimeStatus::Unloaded,
        }) as Box<dyn Runtime>
    });

    let state = Arc::new(AppState::with_factory(config, factory));
    TestApp {
        router: app(state),
        recorder,
    }
}

fn test_app(reply: &str) -> TestApp {
    test_app_with(Config::default(), Ok(reply), false)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn assert_timestamp(value: &Value) {
    let stamp = value.as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok(), "{stamp}");
    assert!(stamp.ends_with('Z'));
    let (_, fraction) = stamp.trim_end_matches('Z').rsplit_once('.').unwrap();
    assert_eq!(fraction.len(), 6);
}

// ---------------------------------------------------------------------------
// /api/generate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn generate_returns_done_response() {
    let app = test_app("  Hi there!  ");

    let (status, body) = send(
        &app.router,
        post("/api/generate", json!({"model": "llama3.2", "prompt": "Hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "llama3.2");
    assert_eq!(body["response"], "Hi there!");
    assert_eq!(body["done"], true);
    assert_eq!(body["load_duration"], 0);
    for field in [
        "total_duration",
        "load_duration",
        "prompt_eval_duration",
        "eval_count",
        "eval_duration",
    ] {
        assert!(body[field].as_u64().is_some(), "{field} missing");
    }
    assert!(body.get("context").is_none());
    assert_timestamp(&body["created_at"]);
}

#[tokio::test]
async fn generate_eval_count_is_character_based() {
    let app = test_app("World!");

    let (_, body) = send(
        &app.router,
        post("/api/generate", json!({"model": "llama3.2", "prompt": "Hello"})),
    )
    .await;

    assert_eq!(body["eval_count"], 11);
}

#[tokio::test]
async fn generate_prepends_system_prompt() {
    let app = test_app("ok");

    let (status, body) = send(
        &app.router,
        post(
            "/api/generate",
            json!({"model": "llama3.2", "prompt": "P", "system": "S"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let requests = app.recorder.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "S\n\nP");
    assert_eq!(requests[0].stop, vec!["User:", "\n\n"]);
    // "S\n\nP" is 4 chars, "ok" is 2
    assert_eq!(body["eval_count"], 6);
}

#[tokio::test]
async fn generate_applies_options_and_defaults() {
    let app = test_app("ok");

    send(
        &app.router,
        post("/api/generate", json!({"model": "llama3.2", "prompt": "a"})),
    )
    .await;
    send(
        &app.router,
        post(
            "/api/generate",
            json!({
                "model": "llama3.2",
                "prompt": "b",
                "options": {"temperature": 0.2, "num_predict": 32, "top_k": 5}
            }),
        ),
    )
    .await;

    let requests = app.recorder.requests();
    assert_eq!(requests[0].max_tokens, Some(512));
    assert!((requests[0].temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(requests[1].max_tokens, Some(32));
    assert!((requests[1].temperature - 0.2).abs() < f32::EPSILON);
}

#[tokio::test]
async fn generate_accepts_float_num_predict() {
    let app = test_app("ok");

    let (status, _) = send(
        &app.router,
        post(
            "/api/generate",
            json!({"model": "llama3.2", "prompt": "a", "options": {"num_predict": 128.0}}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.recorder.requests()[0].max_tokens, Some(128));
}

#[tokio::test]
async fn generate_accepts_ignored_ollama_fields() {
    let app = test_app("ok");

    let (status, _) = send(
        &app.router,
        post(
            "/api/generate",
            json!({
                "model": "llama3.2",
                "prompt": "Hello",
                "template": "{{ .Prompt }}",
                "context": [1, 2, 3],
                "raw": true,
                "format": "json"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn generate_stream_true_matches_non_streaming_shape() {
    let app = test_app("same");

    let (_, streamed) = send(
        &app.router,
        post(
            "/api/generate",
            json!({"model": "llama3.2", "prompt": "Hello", "stream": true}),
        ),
    )
    .await;
    let (_, plain) = send(
        &app.router,
        post(
            "/api/generate",
            json!({"model": "llama3.2", "prompt": "Hello", "stream": false}),
        ),
    )
    .await;

    let keys = |v: &Value| {
        let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&streamed), keys(&plain));
    assert_eq!(streamed["response"], plain["response"]);
    assert_eq!(streamed["done"], true);
}

#[tokio::test]
async fn generate_unknown_model_is_404_without_engine_call() {
    let app = test_app("never");

    let (status, body) = send(
        &app.router,
        post("/api/generate", json!({"model": "mistral", "prompt": "Hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Model 'mistral' not found");
    assert_eq!(app.recorder.loads(), 0);
    assert!(app.recorder.requests().is_empty());
}

#[tokio::test]
async fn generate_load_failure_is_500_with_cause() {
    let app = test_app_with(Config::default(), Ok("never"), true);

    let (status, body) = send(
        &app.router,
        post("/api/generate", json!({"model": "llama3.2", "prompt": "Hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("Failed to load model: "), "{detail}");
    assert!(detail.contains("does not exist"), "{detail}");
}

#[tokio::test]
async fn generate_engine_failure_is_500() {
    let app = test_app_with(Config::default(), Err("out of memory"), false);

    let (status, body) = send(
        &app.router,
        post("/api/generate", json!({"model": "llama3.2", "prompt": "Hello"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Generation failed: out of memory");
}

#[tokio::test]
async fn model_loads_once_across_requests() {
    let app = test_app("ok");

    for _ in 0..3 {
        let (status, _) = send(
            &app.router,
            post("/api/generate", json!({"model": "llama3.2", "prompt": "Hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = send(
        &app.router,
        post(
            "/api/chat",
            json!({"model": "llama3.2", "messages": [{"role": "user", "content": "Hi"}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.recorder.loads(), 1);
    assert_eq!(app.recorder.requests().len(), 4);
}

// ---------------------------------------------------------------------------
// /api/chat
// ---------------------------------------------------------------------------

#[tokio::test]
async fn chat_flattens_conversation() {
    let app = test_app(" Fine, thanks. ");

    let (status, body) = send(
        &app.router,
        post(
            "/api/chat",
            json!({
                "model": "llama3.2",
                "messages": [
                    {"role": "user", "content": "Hi"},
                    {"role": "assistant", "content": "Hello"}
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let requests = app.recorder.requests();
    let prompt = "User: Hi\nAssistant: Hello\nAssistant: ";
    assert_eq!(requests[0].prompt, prompt);

    assert_eq!(body["message"]["role"], "assistant");
    assert_eq!(body["message"]["content"], "Fine, thanks.");
    assert_eq!(body["done"], true);
    assert_eq!(
        body["eval_count"].as_u64().unwrap(),
        (prompt.chars().count() + "Fine, thanks.".chars().count()) as u64
    );
    assert!(body["total_duration"].as_u64().is_some());
    assert_timestamp(&body["created_at"]);
}

#[tokio::test]
async fn chat_stream_true_matches_non_streaming_shape() {
    let app = test_app("same");
    let messages = json!([{"role": "user", "content": "Hi"}]);

    let (status, streamed) = send(
        &app.router,
        post(
            "/api/chat",
            json!({"model": "llama3.2", "messages": messages, "stream": true}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, plain) = send(
        &app.router,
        post(
            "/api/chat",
            json!({"model": "llama3.2", "messages": messages, "stream": false}),
        ),
    )
    .await;

    let keys = |v: &Value| {
        let mut keys: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    };
    assert_eq!(keys(&streamed), keys(&plain));
    assert_eq!(streamed["message"], plain["message"]);
    assert_eq!(streamed["eval_count"], plain["eval_count"]);
    assert_eq!(streamed["done"], true);
}

#[tokio::test]
async fn chat_unknown_model_is_404() {
    let app = test_app("never");

    let (status, body) = send(
        &app.router,
        post(
            "/api/chat",
            json!({"model": "phi3", "messages": [{"role": "user", "content": "Hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Model 'phi3' not found");
    assert!(app.recorder.requests().is_empty());
}

#[tokio::test]
async fn chat_engine_failure_is_500() {
    let app = test_app_with(Config::default(), Err("invalid sampler"), false);

    let (status, body) = send(
        &app.router,
        post(
            "/api/chat",
            json!({"model": "llama3.2", "messages": [{"role": "user", "content": "Hi"}]}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["detail"], "Chat failed: invalid sampler");
}

// ---------------------------------------------------------------------------
// /api/tags, /api/version, /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn tags_reports_zero_size_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.model.path = dir.path().join("absent.gguf");
    let app = test_app_with(config, Ok("ok"), false);

    let (status, body) = send(&app.router, get("/api/tags")).await;

    assert_eq!(status, StatusCode::OK);
    let models = body["models"].as_array().unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0]["name"], "llama3.2");
    assert_eq!(models[0]["size"], 0);
    assert_eq!(models[0]["digest"], "sha256:simulated_digest_value");
    assert_eq!(models[0]["details"]["format"], "gguf");
    assert_timestamp(&models[0]["modified_at"]);
    assert_eq!(app.recorder.loads(), 0);
}

#[tokio::test]
async fn tags_reports_file_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.gguf");
    std::fs::write(&path, vec![0u8; 4096]).unwrap();
    let mut config = Config::default();
    config.model.path = path;
    let app = test_app_with(config, Ok("ok"), false);

    let (_, body) = send(&app.router, get("/api/tags")).await;

    assert_eq!(body["models"][0]["size"], 4096);
}

#[tokio::test]
async fn version_is_fixed() {
    let app = test_app("ok");

    let (status, body) = send(&app.router, get("/api/version")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"version": "0.1.0", "build": "emulation"}));
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app("ok");

    let response = app.router.clone().oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
