//! Command-line front end.
//!
//! Values are layered: built-in defaults, then the optional YAML file, then
//! flags (or their environment variables).

use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "dirserve")]
#[command(about = "Minimal static file server with directory listings")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "DIRSERVE_PORT")]
    pub port: Option<u16>,

    /// Interface address to bind
    #[arg(long, env = "DIRSERVE_HOST")]
    pub host: Option<String>,

    /// Directory to serve
    #[arg(short = 'd', long = "dir", env = "DIRSERVE_ROOT")]
    pub root: Option<PathBuf>,

    /// Number of connection workers
    #[arg(short, long, env = "DIRSERVE_WORKERS")]
    pub workers: Option<usize>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum log level (error, warn, info, debug, trace)
    #[arg(long, default_value_t = Level::INFO)]
    pub log_level: Level,
}

impl Cli {
    /// Builds and validates the immutable runtime configuration.
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(host) = self.host {
            cfg.server.host = host;
        }
        if let Some(workers) = self.workers {
            cfg.server.workers = workers;
        }
        if let Some(root) = self.root {
            cfg.static_files.root = root;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
