use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of connection workers; fixed for the lifetime of the process.
    pub workers: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory exposed to clients. Every request path resolves below it.
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            workers: default_workers(),
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    /// Parses a YAML document. Missing sections and fields keep their defaults.
    pub fn from_yaml(src: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(src).context("invalid YAML configuration")
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&src)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    /// Checks the startup invariants: the served root must be an existing
    /// directory and there must be at least one worker.
    pub fn validate(&self) -> anyhow::Result<()> {
        let root = &self.static_files.root;
        let meta = std::fs::metadata(root)
            .with_context(|| format!("directory {} does not exist", root.display()))?;
        if !meta.is_dir() {
            bail!("{} is not a directory", root.display());
        }
        if self.server.workers == 0 {
            bail!("worker count must be at least 1");
        }
        Ok(())
    }
}
