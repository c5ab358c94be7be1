use std::sync::Arc;

use tokio::net::TcpListener;

use story_generator_service::{AppConfig, ModelRegistry, build_router, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Arc::new(AppConfig::from_env()?);
    tracing::info!(
        model = %config.model_id,
        backend = ?config.backend,
        "initializing story backend"
    );

    let setup = config.clone();
    let registry =
        Arc::new(tokio::task::spawn_blocking(move || ModelRegistry::initialize(&setup)).await?);
    let info = registry.model_info();
    if info.mock_mode {
        tracing::warn!(model = %info.model_name, "running in mock mode");
    }

    let router = build_router(config.clone(), registry);

    let listener = TcpListener::bind(config.listen_addr).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, "story server ready");

    axum::serve(listener, router).await?;

    Ok(())
}
