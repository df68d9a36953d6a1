use std::sync::Arc;

use clap::Parser;
use dirserve::cli::Cli;
use dirserve::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cli.log_level)
        .init();

    let cfg = Arc::new(cli.into_config()?);

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::warn!(error = %e, "Cannot listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        }
    };

    server::listener::run(cfg, shutdown).await
}
