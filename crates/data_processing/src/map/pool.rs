//! Worker pool implementation for parallel transform calls.
//!
//! Provides a thread pool that manages worker lifecycle, task distribution,
//! and result collection for [`MapIter`](super::MapIter).
//!
//! # Key features
//! - Bounded channels prevent memory bloat
//! - Graceful shutdown on drop
//! - Thread-local worker IDs for debugging
//! - Generic over task and output types

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crate::map::thread::WORKER_ID;

/// Thread pool for parallel transform calls.
///
/// Manages worker lifecycle and communication through bounded channels:
/// - Task channel: Main thread -> Workers (work distribution, shared queue)
/// - Output channel: Workers -> Main thread (result collection)
/// - Shutdown flag: Enables graceful termination
///
/// # Type Parameters
/// - `Task`: Work items sent to workers
/// - `Output`: Results returned from workers
pub(crate) struct WorkerPool<Task, Output> {
    workers: Vec<thread::JoinHandle<()>>,
    task_tx: Option<Sender<Task>>,
    output_rx: Receiver<Output>,
    shutdown: Arc<AtomicBool>,
}

impl<Task, Output> WorkerPool<Task, Output>
where
    Task: Send + 'static,
    Output: Send + 'static,
{
    /// Creates a new worker pool where all workers pull from one queue.
    ///
    /// Both channels hold `buffer_size` items. Callers that never have more
    /// than `buffer_size` tasks outstanding can't block on either side.
    pub(crate) fn new<F>(num_workers: usize, buffer_size: usize, worker_fn: F) -> Result<Self>
    where
        F: Fn(Receiver<Task>, Sender<Output>, Arc<AtomicBool>) + Send + Sync + 'static,
    {
        // Validation
        if num_workers == 0 {
            return Err(anyhow!(
                "Cannot create WorkerPool with 0 workers. \
                Either set num_parallel_calls > 0 or apply the transform inline."
            ));
        }

        if buffer_size == 0 {
            return Err(anyhow!(
                "Cannot create WorkerPool with buffer_size 0. \
                Buffer size must be > 0 to prevent deadlocks."
            ));
        }

        let (task_tx, task_rx) = bounded(buffer_size);
        let (output_tx, output_rx) = bounded(buffer_size);

        let shutdown = Arc::new(AtomicBool::new(false));
        let worker_fn = Arc::new(worker_fn);
        let mut workers = Vec::with_capacity(num_workers);

        // Spawn workers
        for worker_id in 0..num_workers {
            let task_rx = task_rx.clone();
            let output_tx = output_tx.clone();
            let shutdown_clone = shutdown.clone();
            let worker_fn_clone = worker_fn.clone();

            let handle = thread::Builder::new()
                .name(format!("map-worker-{}", worker_id))
                .spawn(move || {
                    WORKER_ID.with(|id| id.set(Some(worker_id)));
                    worker_fn_clone(task_rx, output_tx, shutdown_clone);
                    trace!("map worker {} exited", worker_id);
                })
                .with_context(|| format!("Failed to spawn worker thread {}", worker_id))?;

            workers.push(handle);
        }

        debug!(
            "started map worker pool: {} workers, buffer size {}",
            num_workers, buffer_size
        );

        Ok(Self {
            workers,
            task_tx: Some(task_tx),
            output_rx,
            shutdown,
        })
    }
}

impl<Task, Output> WorkerPool<Task, Output> {
    /// Queues a task for the next idle worker.
    pub(crate) fn send(&self, task: Task) -> Result<()> {
        self.task_tx
            .as_ref()
            .ok_or_else(|| anyhow!("Worker pool is shut down"))?
            .send(task)
            .map_err(|_| anyhow!("Task channel closed - all workers have exited"))
    }

    pub(crate) fn output(&self) -> &Receiver<Output> {
        &self.output_rx
    }
}

impl<Task, Output> Drop for WorkerPool<Task, Output> {
    fn drop(&mut self) {
        // Signal shutdown to all workers
        self.shutdown.store(true, Ordering::Relaxed);

        // Drop the task sender to close the channel
        self.task_tx.take();

        // Wait for workers to finish
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }

        debug!("map worker pool shut down");
    }
}
