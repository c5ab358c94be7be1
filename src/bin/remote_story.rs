//! Talks to a running story server elsewhere.
//!
//! ```text
//! REMOTE_URL=https://stories.example.com remote_story "Two strangers meet at a masquerade ball" romance short 0.7
//! ```

use std::env;

use anyhow::{Context, bail};

use story_generator_service::{RemoteClient, StoryParams, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let base_url = env::var("REMOTE_URL").context("REMOTE_URL must point at a story server")?;
    let mut args = env::args().skip(1);
    let prompt = args.next().context("usage: remote_story <prompt> [genre] [length] [temperature]")?;

    let mut params = StoryParams::new(prompt);
    if let Some(genre) = args.next() {
        params.genre = genre;
    }
    if let Some(length) = args.next() {
        params.length = length;
    }
    if let Some(temperature) = args.next() {
        params.temperature = temperature
            .parse()
            .with_context(|| format!("temperature must be a number, got {temperature}"))?;
    }

    let client = RemoteClient::new(&base_url);
    let health = match client.check_connection().await {
        Ok(health) => health,
        Err(err) => bail!("{}", serde_json::to_string(&err)?),
    };
    let model = health
        .model_info
        .as_ref()
        .map_or("unknown", |info| info.model_name.as_str());
    tracing::info!(
        status = %health.status,
        model,
        loaded = health.model_loaded,
        "remote server reachable"
    );
    if health.status != "healthy" {
        bail!("remote server reports status {}", health.status);
    }

    match client.generate_story(&params).await {
        Ok(story) => {
            let backend = story.response.backend.map_or("unknown", |b| b.as_str());
            println!(
                "Generated in {:.2} seconds ({backend} backend):\n",
                story.generation_time_secs
            );
            println!("{}", story.response.story);
            Ok(())
        }
        Err(err) => bail!("{}", serde_json::to_string(&err)?),
    }
}
