use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    model::{GenerationBackend, ModelInfo, QueueStatus},
    story::GenerationRequest,
};

pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
pub const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Status,
    Decode,
    Request,
}

impl TransportErrorKind {
    fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Status => "status",
            TransportErrorKind::Decode => "decode",
            TransportErrorKind::Request => "request",
        }
    }
}

/// Failure talking to a remote instance, shaped as a serializable result
/// object: `{"status": "error", "kind": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{} error: {message}", .kind.as_str())]
pub struct TransportError {
    pub status: &'static str,
    pub kind: TransportErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl TransportError {
    fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: "error",
            kind,
            message: message.into(),
            http_status: None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_decode() {
            TransportErrorKind::Decode
        } else {
            TransportErrorKind::Request
        };
        let mut error = Self::new(kind, err.to_string());
        error.http_status = err.status().map(|s| s.as_u16());
        error
    }
}

/// Body of `POST /api/generate` as sent by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryParams {
    pub prompt: String,
    pub genre: String,
    pub length: String,
    pub temperature: f64,
}

impl StoryParams {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            genre: "romance".to_string(),
            length: "medium".to_string(),
            temperature: 0.7,
        }
    }
}

/// Success body of `POST /api/generate` as the client reads it. Only `story`
/// and `status` are required; a server may leave the rest out.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteGeneration {
    pub story: String,
    pub status: String,
    #[serde(default)]
    pub backend: Option<GenerationBackend>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
    #[serde(default)]
    pub parameters: Option<GenerationRequest>,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
}

/// Body of `GET /health` as the client reads it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteHealth {
    pub status: String,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_info: Option<ModelInfo>,
    #[serde(default)]
    pub queue: Option<QueueStatus>,
}

#[derive(Debug, Clone)]
pub struct RemoteStory {
    pub response: RemoteGeneration,
    pub generation_time_secs: f64,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for another instance of this service reachable over HTTP.
pub struct RemoteClient {
    base_url: String,
    client: reqwest::Client,
    health_timeout: Duration,
    generate_timeout: Duration,
}

impl RemoteClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            health_timeout: HEALTH_TIMEOUT,
            generate_timeout: GENERATE_TIMEOUT,
        }
    }

    pub fn with_timeouts(mut self, health: Duration, generate: Duration) -> Self {
        self.health_timeout = health;
        self.generate_timeout = generate;
        self
    }

    pub fn health_url(&self) -> String {
        format!("{}/health", self.base_url)
    }

    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }

    pub async fn check_connection(&self) -> Result<RemoteHealth, TransportError> {
        debug!(url = %self.health_url(), "checking remote health");
        let result = self.fetch_health().await;
        if let Err(err) = &result {
            warn!(url = %self.health_url(), error = %err, "remote health check failed");
        }
        result
    }

    pub async fn generate_story(&self, params: &StoryParams) -> Result<RemoteStory, TransportError> {
        let started = Instant::now();
        let result = self.post_generate(params).await.map(|response| RemoteStory {
            response,
            generation_time_secs: started.elapsed().as_secs_f64(),
        });
        if let Err(err) = &result {
            warn!(url = %self.generate_url(), error = %err, "remote generation failed");
        }
        result
    }

    async fn fetch_health(&self) -> Result<RemoteHealth, TransportError> {
        let response = self
            .client
            .get(self.health_url())
            .timeout(self.health_timeout)
            .send()
            .await?;
        let health = ensure_success(response).await?.json::<RemoteHealth>().await?;
        Ok(health)
    }

    async fn post_generate(&self, params: &StoryParams) -> Result<RemoteGeneration, TransportError> {
        let response = self
            .client
            .post(self.generate_url())
            .json(params)
            .timeout(self.generate_timeout)
            .send()
            .await?;
        let story = ensure_success(response).await?.json::<RemoteGeneration>().await?;
        Ok(story)
    }
}

/// Turns non-2xx replies into `TransportError`, keeping the server's
/// `{"error": ...}` message when there is one.
async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or(body);
    let mut error = TransportError::new(TransportErrorKind::Status, format!("HTTP {status}: {detail}"));
    error.http_status = Some(status.as_u16());
    Err(error)
}
