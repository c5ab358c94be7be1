use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

const DEFAULT_PORT: u16 = 5000;

/// Which kind of backend to attempt at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Skip backend setup entirely and serve templated stories.
    Mock,
    /// Load a TorchScript causal LM (requires the `tch-backend` feature).
    Torch,
}

impl BackendKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mock" => Some(BackendKind::Mock),
            "torch" | "tch" => Some(BackendKind::Torch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub model_id: String,
    pub backend: BackendKind,
    pub model_dir: PathBuf,
    pub device: String,
    pub generation_workers: usize,
    pub generation_queue_depth: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::from_lookup(|key| env::var(key).ok()))
    }

    /// Builds a config from an arbitrary key lookup. Unparseable values fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = lookup("SERVER_ADDR")
            .and_then(|v| v.parse().ok())
            .or_else(|| {
                lookup("PORT")
                    .and_then(|v| v.parse::<u16>().ok())
                    .map(|port| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port))
            })
            .unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT));

        let model_id = lookup("MODEL_ID")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "distilgpt2".to_string());

        let backend = lookup("MODEL_BACKEND")
            .and_then(|v| BackendKind::parse(&v))
            .unwrap_or(BackendKind::Mock);

        let model_dir = PathBuf::from(lookup("MODEL_DIR").unwrap_or_else(|| "models".to_string()));
        let device = lookup("DEVICE").unwrap_or_else(|| "cpu".into());

        let generation_workers = lookup("GENERATION_WORKERS")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        let generation_queue_depth = lookup("GENERATION_QUEUE_DEPTH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8);

        Self {
            listen_addr,
            model_id,
            backend,
            model_dir,
            device,
            generation_workers,
            generation_queue_depth,
        }
    }

    /// Directory holding `model.ts` and `tokenizer.json` for a model id.
    pub fn artifact_dir(&self, model_id: &str) -> PathBuf {
        artifact_dir(&self.model_dir, model_id)
    }
}

fn artifact_dir(root: &Path, model_id: &str) -> PathBuf {
    root.join(model_id.trim().replace('/', "__"))
}
