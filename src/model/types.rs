use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::story::GenerationRequest;

/// Knobs forwarded to a real backend. Inert for mock generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_p: f64,
    pub max_new_tokens: u32,
}

impl From<&GenerationRequest> for SamplingParams {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            temperature: request.temperature,
            top_p: request.top_p,
            max_new_tokens: request.max_tokens,
        }
    }
}

/// Snapshot of the adapter currently serving requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub model_name: String,
    pub mock_mode: bool,
    pub loaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    Mock,
    Model,
}

impl GenerationBackend {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationBackend::Mock => "mock",
            GenerationBackend::Model => "model",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub story: String,
    pub backend: GenerationBackend,
    pub elapsed_ms: u64,
}

impl GenerationResult {
    pub fn new(story: String, backend: GenerationBackend, elapsed: Duration) -> Self {
        Self {
            story,
            backend,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}
