mod adapter;
mod catalog;
#[cfg(feature = "tch-backend")]
mod loader;
mod queue;
mod registry;
mod types;

pub use adapter::{BackendState, ModelAdapter, TextBackend};
pub use catalog::{CATALOG, CatalogEntry, OptimizationLevel, OptimizationPreset};
#[cfg(feature = "tch-backend")]
pub use loader::TorchBackend;
pub use queue::{GenerationPermit, GenerationQueue, QueueStatus};
pub use registry::ModelRegistry;
pub use types::{GenerationBackend, GenerationResult, ModelInfo, SamplingParams};
