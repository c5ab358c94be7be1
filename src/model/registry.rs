use std::{sync::Arc, time::Instant};

use parking_lot::RwLock;
use tokio::task;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, BackendKind},
    error::ServiceError,
    model::{
        adapter::ModelAdapter,
        queue::{GenerationQueue, QueueStatus},
        types::{GenerationBackend, GenerationResult, ModelInfo, SamplingParams},
    },
    story::{GenerationRequest, MockGenerator},
};

/// Owns the process-wide adapter. Readers take a snapshot `Arc`; a switch
/// builds the replacement first and then publishes it in one write.
pub struct ModelRegistry {
    current: RwLock<Arc<ModelAdapter>>,
    queue: GenerationQueue,
    mock: MockGenerator,
}

impl ModelRegistry {
    pub fn initialize(config: &AppConfig) -> Self {
        let adapter = ModelAdapter::initialize(&config.model_id, config, config.backend);
        let queue = GenerationQueue::new(config.generation_workers, config.generation_queue_depth);
        Self::new(adapter, queue)
    }

    pub fn new(adapter: ModelAdapter, queue: GenerationQueue) -> Self {
        Self {
            current: RwLock::new(Arc::new(adapter)),
            queue,
            mock: MockGenerator::default(),
        }
    }

    pub fn current(&self) -> Arc<ModelAdapter> {
        self.current.read().clone()
    }

    pub fn model_info(&self) -> ModelInfo {
        self.current().info()
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Publishes `adapter` and hands back the one it replaced.
    pub fn replace(&self, adapter: ModelAdapter) -> Arc<ModelAdapter> {
        let next = Arc::new(adapter);
        std::mem::replace(&mut *self.current.write(), next)
    }

    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, ServiceError> {
        let adapter = self.current();
        let started = Instant::now();

        if !adapter.is_available() {
            let story = self
                .mock
                .generate(&request.prompt, request.genre.as_str(), request.length);
            return Ok(GenerationResult::new(
                story,
                GenerationBackend::Mock,
                started.elapsed(),
            ));
        }

        let permit = self.queue.acquire().await?;
        debug!(
            model = adapter.model_name(),
            queued_ms = started.elapsed().as_millis() as u64,
            "generation slot acquired"
        );

        let instruction = request.instruction();
        let params = SamplingParams::from(request);
        // The slot is released when the backend call returns, not when the
        // caller stops waiting for it.
        let story = task::spawn_blocking(move || {
            let _permit = permit;
            adapter.generate(&instruction, &params)
        })
        .await
        .map_err(|err| ServiceError::BackendGeneration(format!("generation task failed: {err}")))??;

        Ok(GenerationResult::new(
            story,
            GenerationBackend::Model,
            started.elapsed(),
        ))
    }

    /// Builds an adapter for `model_name`, always attempting the real backend,
    /// and publishes it whether or not the backend came up.
    pub async fn switch_model(
        &self,
        model_name: &str,
        config: Arc<AppConfig>,
    ) -> Result<ModelInfo, ServiceError> {
        let name = model_name.to_string();
        let adapter = task::spawn_blocking(move || {
            ModelAdapter::initialize(&name, &config, BackendKind::Torch)
        })
        .await
        .map_err(|err| ServiceError::Internal(format!("model initialization task failed: {err}")))?;

        let info = adapter.info();
        let previous = self.replace(adapter);
        info!(
            from = previous.model_name(),
            to = %info.model_name,
            loaded = info.loaded,
            "model switched"
        );
        Ok(info)
    }
}
