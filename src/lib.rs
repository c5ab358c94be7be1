pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod server;
pub mod story;

pub use client::{RemoteClient, StoryParams, TransportError};
pub use config::AppConfig;
pub use error::{ServiceError, ValidationError};
pub use model::{ModelAdapter, ModelInfo, ModelRegistry, TextBackend};
pub use server::build_router;
pub use story::{GenerationRequest, MockGenerator, TemplateStore, validate};

/// Installs the fmt subscriber used by the binaries. A no-op when a global
/// dispatcher is already set.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    if tracing::dispatcher::has_been_set() {
        return;
    }
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hyper=warn,axum::rejection=trace".into());
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
