use log2::*;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

/// Unit of work executed by a pool worker.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Fixed-size set of workers draining one shared job queue.
pub struct WorkerPool {
    name: &'static str,
    sender: mpsc::UnboundedSender<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Cloneable submission side of a [`WorkerPool`].
#[derive(Clone)]
pub struct PoolHandle {
    name: &'static str,
    sender: mpsc::UnboundedSender<Job>,
}

impl PoolHandle {
    /// Queues `job`. Gives the job back if the pool has shut down; the caller
    /// usually just drops it.
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        self.sender.send(job).map_err(|rejected| {
            debug!("{} pool is closed, rejecting job", self.name);
            rejected.0
        })
    }
}

impl WorkerPool {
    pub fn spawn(runtime: &Handle, name: &'static str, size: usize) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(size);

        for worker_id in 0..size {
            let receiver = Arc::clone(&receiver);
            workers.push(runtime.spawn(async move {
                debug!("{} worker {} started", name, worker_id);
                loop {
                    let job = {
                        let mut queue = receiver.lock().await;
                        queue.recv().await
                    };
                    match job {
                        Some(job) => job.await,
                        None => break,
                    }
                }
                debug!("{} worker {} finished", name, worker_id);
            }));
        }

        Self {
            name,
            sender,
            workers: Mutex::new(workers),
        }
    }

    pub fn handle(&self) -> PoolHandle {
        PoolHandle {
            name: self.name,
            sender: self.sender.clone(),
        }
    }

    pub fn submit(&self, job: Job) -> Result<(), Job> {
        self.handle().submit(job)
    }

    /// Interrupts every worker and waits for all of them to stop.
    ///
    /// Jobs still queued are dropped together with the queue once the last
    /// worker is gone, so anything they hold is released. Calling this twice
    /// is harmless.
    pub async fn shutdown(&self) {
        let workers = std::mem::take(&mut *self.workers.lock().await);
        if workers.is_empty() {
            return;
        }
        for worker in &workers {
            worker.abort();
        }
        for worker in workers {
            if let Err(e) = worker.await {
                if !e.is_cancelled() {
                    error!("{} worker failed during shutdown: {}", self.name, e);
                }
            }
        }
        info!("{} pool shut down", self.name);
    }

    /// Aborts workers without waiting for them.
    fn abort_all(&mut self) {
        for worker in self.workers.get_mut().iter() {
            worker.abort();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.abort_all();
    }
}
