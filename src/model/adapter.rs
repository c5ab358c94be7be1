use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::{AppConfig, BackendKind},
    error::ServiceError,
    model::types::{ModelInfo, SamplingParams},
};

/// A loaded text-generation backend. Calls block until generation finishes,
/// so callers run them off the async executor.
pub trait TextBackend: Send + Sync {
    /// Returns only newly generated text, without the prompt.
    fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ServiceError>;

    fn method(&self) -> &'static str;

    fn device(&self) -> String;
}

/// Outcome of backend setup, decided once per adapter.
#[derive(Clone)]
pub enum BackendState {
    Ready(Arc<dyn TextBackend>),
    Unavailable(String),
}

pub struct ModelAdapter {
    model_name: String,
    state: BackendState,
}

impl ModelAdapter {
    /// Best-effort setup. Any failure leaves the adapter in mock mode for
    /// its whole lifetime; it is never retried implicitly.
    pub fn initialize(model_name: &str, config: &AppConfig, kind: BackendKind) -> Self {
        let state = match kind {
            BackendKind::Mock => BackendState::Unavailable("mock backend requested".to_string()),
            BackendKind::Torch => load_torch(model_name, config),
        };

        match &state {
            BackendState::Ready(backend) => {
                info!(model = model_name, device = %backend.device(), "model backend ready")
            }
            BackendState::Unavailable(reason) => {
                warn!(model = model_name, %reason, "model backend unavailable, serving mock stories")
            }
        }

        Self {
            model_name: model_name.to_string(),
            state,
        }
    }

    pub fn ready(model_name: impl Into<String>, backend: Arc<dyn TextBackend>) -> Self {
        Self {
            model_name: model_name.into(),
            state: BackendState::Ready(backend),
        }
    }

    pub fn unavailable(model_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            state: BackendState::Unavailable(reason.into()),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn state(&self) -> &BackendState {
        &self.state
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, BackendState::Ready(_))
    }

    pub fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String, ServiceError> {
        match &self.state {
            BackendState::Ready(backend) => backend
                .generate(prompt, params)
                .map(|text| text.trim().to_string()),
            BackendState::Unavailable(reason) => Err(ServiceError::BackendUnavailable(reason.clone())),
        }
    }

    pub fn info(&self) -> ModelInfo {
        match &self.state {
            BackendState::Ready(backend) => ModelInfo {
                model_name: self.model_name.clone(),
                mock_mode: false,
                loaded: true,
                method: Some(backend.method().to_string()),
                device: Some(backend.device()),
                fallback_reason: None,
            },
            BackendState::Unavailable(reason) => ModelInfo {
                model_name: self.model_name.clone(),
                mock_mode: true,
                loaded: false,
                method: None,
                device: None,
                fallback_reason: Some(reason.clone()),
            },
        }
    }
}

#[cfg(feature = "tch-backend")]
fn load_torch(model_name: &str, config: &AppConfig) -> BackendState {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use crate::model::loader::TorchBackend;

    let dir = config.artifact_dir(model_name);
    match catch_unwind(AssertUnwindSafe(|| TorchBackend::load(&dir, &config.device))) {
        Ok(Ok(backend)) => BackendState::Ready(Arc::new(backend)),
        Ok(Err(err)) => BackendState::Unavailable(err.to_string()),
        Err(_) => BackendState::Unavailable(format!("backend setup for {model_name} panicked")),
    }
}

#[cfg(not(feature = "tch-backend"))]
fn load_torch(model_name: &str, _config: &AppConfig) -> BackendState {
    BackendState::Unavailable(format!(
        "cannot load {model_name}: built without the tch-backend feature"
    ))
}
