//! Fixed-size worker pool with a rendezvous hand-off.
//!
//! Idle workers park a one-shot slot in the `idle` queue and wait on it.
//! `dispatch` takes a slot and fills it, so an item is only handed over when
//! some worker is ready to run it. No items are buffered: with every worker
//! busy, `dispatch` waits, and so does whoever calls it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub struct WorkerPool<T> {
    idle: mpsc::Receiver<oneshot::Sender<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T> WorkerPool<T>
where
    T: Send + 'static,
{
    /// Starts `size` workers, each running `handler(worker_id, item)` for
    /// one item at a time.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn spawn<H, Fut>(size: usize, handler: H) -> Self
    where
        H: Fn(usize, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        assert!(size > 0, "worker pool needs at least one worker");

        // one outstanding slot per worker at most
        let (idle_tx, idle) = mpsc::channel(size);
        let handler = Arc::new(handler);

        let workers = (0..size)
            .map(|id| {
                let idle_tx = idle_tx.clone();
                let handler = Arc::clone(&handler);
                tokio::spawn(worker_loop(id, idle_tx, handler))
            })
            .collect();

        Self { idle, workers }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Hands `item` to the next idle worker, waiting until one is free.
    ///
    /// Returns the item back if every worker has exited.
    pub async fn dispatch(&mut self, item: T) -> Result<(), T> {
        let mut item = item;
        loop {
            let Some(slot) = self.idle.recv().await else {
                return Err(item);
            };

            match slot.send(item) {
                Ok(()) => return Ok(()),
                // that worker went away between parking and now; try another
                Err(returned) => item = returned,
            }
        }
    }

    /// Closes the hand-off and waits for the workers to finish their
    /// current item and exit.
    pub async fn shutdown(self) {
        let Self { idle, workers } = self;
        drop(idle);

        for handle in workers {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task failed");
            }
        }
    }
}

async fn worker_loop<T, H, Fut>(
    id: usize,
    idle_tx: mpsc::Sender<oneshot::Sender<T>>,
    handler: Arc<H>,
) where
    T: Send + 'static,
    H: Fn(usize, T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        let (slot, item_rx) = oneshot::channel();
        if idle_tx.send(slot).await.is_err() {
            break;
        }

        let item = match item_rx.await {
            Ok(item) => item,
            Err(_) => break,
        };

        // Run in a child task so a panicking handler does not take the
        // worker down. Awaiting it keeps the worker busy until it finishes.
        if let Err(e) = tokio::spawn((*handler)(id, item)).await {
            error!(worker = id, error = %e, "Handler panicked");
        }
    }

    debug!(worker = id, "Worker stopped");
}
