use std::sync::Arc;
use tokio::sync::watch;

/// Counting barrier over a dynamically growing set of tasks.
///
/// Every submitted task registers one [`Arrival`] and departs when that guard
/// is dropped, so a task spawned by another task inside the same layer keeps
/// the barrier closed until it finishes too. [`LayerBarrier::wait`] returns
/// once the count is back to zero; the barrier is then ready for the next layer.
pub struct LayerBarrier {
    pending: watch::Sender<usize>,
}

impl LayerBarrier {
    pub fn new() -> Self {
        let (pending, _) = watch::channel(0);
        Self { pending }
    }

    /// Registers one outstanding task.
    pub fn register(self: &Arc<Self>) -> Arrival {
        self.pending.send_modify(|count| *count += 1);
        Arrival {
            barrier: Arc::clone(self),
        }
    }

    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Waits until every registered task has departed.
    pub async fn wait(&self) {
        let mut pending = self.pending.subscribe();
        // the sender lives in `self`, so the channel can't close under us
        let _ = pending.wait_for(|count| *count == 0).await;
    }

    fn depart(&self) {
        self.pending.send_modify(|count| *count -= 1);
    }
}

impl Default for LayerBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// One registration on a [`LayerBarrier`]; departs exactly once on drop,
/// whether the task finished, failed, or was dropped without ever running.
#[must_use = "dropping an Arrival departs from the barrier immediately"]
pub struct Arrival {
    barrier: Arc<LayerBarrier>,
}

impl Drop for Arrival {
    fn drop(&mut self) {
        self.barrier.depart();
    }
}
