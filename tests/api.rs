use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    thread,
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use story_generator_service::{
    AppConfig, MockGenerator, ModelAdapter, ModelRegistry, ServiceError, TextBackend,
    build_router,
    model::{GenerationQueue, SamplingParams},
    story::StoryLength,
};

const PROMPT: &str = "Two rival cartographers share a lantern";

/// Counts calls and answers with a fixed story, or a fixed failure.
struct ScriptedBackend {
    calls: AtomicUsize,
    delay: Duration,
    reply: Result<&'static str, &'static str>,
}

impl ScriptedBackend {
    fn ok(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            reply: Ok(text),
        })
    }

    fn slow(text: &'static str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
            reply: Ok(text),
        })
    }

    fn failing(reason: &'static str) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay: Duration::ZERO,
            reply: Err(reason),
        })
    }
}

impl TextBackend for ScriptedBackend {
    fn generate(&self, _prompt: &str, _params: &SamplingParams) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        self.reply
            .map(str::to_string)
            .map_err(|reason| ServiceError::BackendGeneration(reason.to_string()))
    }

    fn method(&self) -> &'static str {
        "scripted"
    }

    fn device(&self) -> String {
        "cpu".into()
    }
}

fn router_with(adapter: ModelAdapter) -> Router {
    let config = Arc::new(AppConfig::from_lookup(|key| {
        (key == "MODEL_DIR").then(|| "/nonexistent/story-models".to_string())
    }));
    let registry = Arc::new(ModelRegistry::new(adapter, GenerationQueue::new(1, 0)));
    build_router(config, registry)
}

fn mock_router() -> Router {
    router_with(ModelAdapter::unavailable(
        "distilgpt2",
        "mock backend requested",
    ))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn mock_mode_generates_the_templated_story() {
    let router = mock_router();
    let (status, body) = send(
        &router,
        post_json(
            "/api/generate",
            json!({ "prompt": PROMPT, "genre": "romance", "length": "short" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["backend"], "mock");
    assert_eq!(
        body["story"],
        MockGenerator::default().generate(PROMPT, "romance", StoryLength::Short)
    );
    assert_eq!(body["parameters"]["genre"], "romance");
    assert_eq!(body["parameters"]["temperature"], 0.7);
    assert_eq!(body["model_info"]["mock_mode"], true);
}

#[tokio::test]
async fn omitted_fields_resolve_to_defaults() {
    let (status, body) = send(
        &mock_router(),
        post_json("/api/generate", json!({ "prompt": PROMPT })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["parameters"]["genre"], "romance");
    assert_eq!(body["parameters"]["length"], "medium");
    assert_eq!(body["parameters"]["top_p"], 0.9);
    assert_eq!(body["parameters"]["max_tokens"], 1024);
    assert_eq!(
        body["story"],
        MockGenerator::default().generate(PROMPT, "romance", StoryLength::Medium)
    );
}

#[tokio::test]
async fn invalid_requests_never_reach_the_backend() {
    let backend = ScriptedBackend::ok("should not be produced");
    let router = router_with(ModelAdapter::ready("scripted", backend.clone()));

    let cases = [
        (json!({ "prompt": "   ", "genre": "fantasy" }), "prompt is required"),
        (json!({ "genre": "fantasy" }), "prompt is required"),
        (json!({ "prompt": PROMPT, "genre": "horror" }), "invalid genre: horror"),
        (json!({ "prompt": PROMPT, "length": "epic" }), "invalid length: epic"),
        (
            json!({ "prompt": PROMPT, "temperature": 1.5 }),
            "temperature must be between 0.0 and 1.0, got 1.5",
        ),
        (
            json!({ "prompt": PROMPT, "temperature": -0.1 }),
            "temperature must be between 0.0 and 1.0, got -0.1",
        ),
    ];

    for (request, message) in cases {
        let (status, body) = send(&router, post_json("/api/generate", request)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], message);
    }
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_json_is_a_client_error() {
    let request = Request::post("/api/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"prompt\": "))
        .unwrap();
    let (status, body) = send(&mock_router(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("invalid request"));
}

#[tokio::test]
async fn ready_backend_generates_the_story() {
    let backend = ScriptedBackend::ok("\n  The lantern guttered out.  \n");
    let router = router_with(ModelAdapter::ready("scripted", backend.clone()));

    let (status, body) = send(
        &router,
        post_json("/api/generate", json!({ "prompt": PROMPT, "genre": "historical" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "model");
    assert_eq!(body["story"], "The lantern guttered out.");
    assert_eq!(body["model_info"]["method"], "scripted");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn backend_failure_is_a_server_error_not_a_mock_story() {
    let backend = ScriptedBackend::failing("CUDA out of memory");
    let router = router_with(ModelAdapter::ready("scripted", backend));

    let (status, body) = send(
        &router,
        post_json("/api/generate", json!({ "prompt": PROMPT })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "model generation failed: CUDA out of memory");
    assert!(body.get("story").is_none());
}

#[tokio::test]
async fn saturated_queue_turns_requests_away() {
    let backend = ScriptedBackend::slow("The tide came in.", Duration::from_millis(400));
    let router = router_with(ModelAdapter::ready("scripted", backend.clone()));

    let first = tokio::spawn({
        let router = router.clone();
        async move {
            send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))).await
        }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let (status, body) = send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "error": "generation queue is full" }));

    let (status, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["story"], "The tide came in.");
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_request_keeps_the_backend_slot() {
    let backend = ScriptedBackend::slow("The tide came in.", Duration::from_millis(400));
    let router = router_with(ModelAdapter::ready("scripted", backend.clone()));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(100),
        send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))),
    )
    .await;
    assert!(abandoned.is_err());

    let (status, body) = send(&router, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"]["in_flight"], 1);
    let (status, _) = send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    tokio::time::sleep(Duration::from_millis(600)).await;
    let (status, _) = send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn explicit_null_genre_is_a_client_error() {
    let (status, body) = send(
        &mock_router(),
        post_json("/api/generate", json!({ "prompt": PROMPT, "genre": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid genre: null");
}

#[tokio::test]
async fn health_reports_whether_a_model_is_loaded() {
    let (status, body) = send(&mock_router(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], false);
    assert_eq!(body["model_info"]["fallback_reason"], "mock backend requested");
    assert_eq!(body["queue"]["in_flight"], 0);

    let router = router_with(ModelAdapter::ready("scripted", ScriptedBackend::ok("x")));
    let (_, body) = send(&router, get("/health")).await;
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_info"]["device"], "cpu");
}

#[tokio::test]
async fn catalog_lists_models_and_the_current_one() {
    let (status, body) = send(&mock_router(), get("/api/models")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["current_model"], "distilgpt2");
    let names: Vec<&str> = body["available_models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"distilgpt2"));
    assert!(names.contains(&"gpt2"));
}

#[tokio::test]
async fn switch_model_requires_a_name() {
    for body in [json!({}), json!({ "model_name": "  " })] {
        let (status, body) = send(&mock_router(), post_json("/api/switch-model", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid request: model_name is required");
    }
}

#[tokio::test]
async fn failed_switch_publishes_a_mock_adapter() {
    let router = router_with(ModelAdapter::ready("scripted", ScriptedBackend::ok("x")));

    let (status, body) = send(
        &router,
        post_json("/api/switch-model", json!({ "model_name": "gpt2-medium" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Switched to gpt2-medium");
    assert_eq!(body["model_info"]["model_name"], "gpt2-medium");

    let (_, health) = send(&router, get("/health")).await;
    assert_eq!(health["model_loaded"], false);
    assert_eq!(health["model_info"]["model_name"], "gpt2-medium");

    let (_, story) = send(&router, post_json("/api/generate", json!({ "prompt": PROMPT }))).await;
    assert_eq!(story["backend"], "mock");
}

#[tokio::test]
async fn optimize_returns_presets() {
    let (status, body) = send(
        &mock_router(),
        post_json("/api/optimize", json!({ "level": "speed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], "speed");
    assert_eq!(body["optimizations"]["low_cpu_mem_usage"], true);

    let (_, body) = send(&mock_router(), post_json("/api/optimize", json!({ "level": "turbo" }))).await;
    assert_eq!(body["level"], "balanced");
    assert!(body["optimizations"].get("low_cpu_mem_usage").is_none());
}

#[tokio::test]
async fn index_serves_the_browser_form() {
    let response = mock_router().oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("<form id=\"story-form\">"));
    assert!(page.contains("/api/generate"));
}
