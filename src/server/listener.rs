use std::future::Future;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fs::Resolver;
use crate::http::connection::Connection;
use crate::server::pool::WorkerPool;

/// Time budget for a connection, counted from acceptance. Time spent waiting
/// for a free worker is part of it.
pub const CONNECTION_BUDGET: Duration = Duration::from_secs(5);

/// An accepted connection on its way to a worker.
pub struct Incoming {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub deadline: Instant,
}

/// Binds the configured address and serves until `shutdown` completes or a
/// fatal error occurs.
pub async fn run<F>(cfg: Arc<Config>, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let addr = cfg.server.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;
    info!("Listening on {}", addr);

    serve_until(listener, cfg, shutdown).await
}

/// Accept loop over an already bound listener, with no shutdown trigger.
pub async fn serve(listener: TcpListener, cfg: Arc<Config>) -> anyhow::Result<()> {
    serve_until(listener, cfg, std::future::pending()).await
}

/// Accept loop over an already bound listener.
///
/// Once `shutdown` completes no further connections are accepted, and the
/// call returns after the workers have finished their current connections.
pub async fn serve_until<F>(
    listener: TcpListener,
    cfg: Arc<Config>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    let resolver = Resolver::new(&cfg.static_files.root).with_context(|| {
        format!(
            "failed to open served root {}",
            cfg.static_files.root.display()
        )
    })?;
    let resolver_root = resolver.root().to_path_buf();
    let resolver = Arc::new(resolver);

    let mut pool = WorkerPool::spawn(cfg.server.workers, move |worker, incoming: Incoming| {
        let resolver = Arc::clone(&resolver);
        async move {
            debug!(worker, peer = %incoming.peer, "Worker handling connection");
            let status = Connection::new(incoming.stream, incoming.deadline, resolver)
                .run()
                .await;
            debug!(
                worker,
                peer = %incoming.peer,
                status = status.as_u16(),
                "Connection closed"
            );
        }
    });

    info!(
        root = %resolver_root.display(),
        workers = pool.size(),
        "Serving directory"
    );

    tokio::pin!(shutdown);

    loop {
        let accepted = tokio::select! {
            _ = &mut shutdown => break,
            res = listener.accept() => res,
        };

        let (socket, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(e) if is_transient(e.kind()) => {
                warn!(error = %e, "Dropped connection during accept");
                continue;
            }
            Err(e) => return Err(e).context("failed to accept connection"),
        };

        // armed before the hand-off, so queueing eats into the budget
        let deadline = Instant::now() + CONNECTION_BUDGET;
        info!("Accepted connection from {}", peer);

        let incoming = Incoming {
            stream: socket,
            peer,
            deadline,
        };
        tokio::select! {
            _ = &mut shutdown => break,
            res = pool.dispatch(incoming) => {
                if res.is_err() {
                    anyhow::bail!("all connection workers have exited");
                }
            }
        }
    }

    info!("Stopping connection workers");
    pool.shutdown().await;
    Ok(())
}

fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionReset
            | ErrorKind::Interrupted
            | ErrorKind::WouldBlock
    )
}
