use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    /// Pinecone index name.
    pub name: String,
    /// Data-plane host. Resolved through the control plane when absent.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Namespace to query. The index default namespace when absent.
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_dimension() -> usize {
    1024
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Metadata category that marks advertisement videos.
    #[serde(default = "default_ad_category")]
    pub ad_category: String,
    /// Top-K when recovering a video's clip vectors.
    #[serde(default = "default_clip_candidates")]
    pub clip_candidates: usize,
    /// Nearest neighbors requested per scope.
    #[serde(default = "default_similar_top_k")]
    pub similar_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            ad_category: default_ad_category(),
            clip_candidates: default_clip_candidates(),
            similar_top_k: default_similar_top_k(),
        }
    }
}

fn default_ad_category() -> String {
    "ad".to_string()
}
fn default_clip_candidates() -> usize {
    100
}
fn default_similar_top_k() -> usize {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8470".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate index
    if config.index.name.trim().is_empty() {
        anyhow::bail!("index.name must not be empty");
    }
    if config.index.dimension == 0 {
        anyhow::bail!("index.dimension must be > 0");
    }

    // Validate search
    if config.search.clip_candidates < 1 {
        anyhow::bail!("search.clip_candidates must be >= 1");
    }
    if config.search.similar_top_k < 1 {
        anyhow::bail!("search.similar_top_k must be >= 1");
    }

    Ok(config)
}
