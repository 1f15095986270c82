// Dispatcher - bounded worker pool for validator commands

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use super::cache::{CacheLookup, ValidationCache};
use super::handle::{OutcomeHandle, OutcomeSlot};
use crate::domain::{CacheKey, Outcome, RunError, ValidationRequest};
use crate::error::{AppError, Result};
use crate::port::ProcessRunner;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// One unit of work waiting for a worker
struct Job {
    key: CacheKey,
    slot: OutcomeSlot,
}

type JobReceiver = Arc<Mutex<mpsc::UnboundedReceiver<Job>>>;

/// Fixed-size pool running validators through the cache
///
/// `enqueue` never blocks. Work for a (content, command) pair that is
/// already cached or in flight is never submitted twice.
pub struct Dispatcher {
    intake: Option<mpsc::UnboundedSender<Job>>,
    jobs: JobReceiver,
    cache: Arc<ValidationCache>,
    shutdown: ShutdownSender,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    /// Spawn `size` workers on the current tokio runtime
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start(runner: Arc<dyn ProcessRunner>, cache: Arc<ValidationCache>, size: usize) -> Self {
        let size = size.max(1);
        let (tx, rx) = mpsc::unbounded_channel();
        let jobs: JobReceiver = Arc::new(Mutex::new(rx));
        let (shutdown, token) = shutdown_channel();

        let workers = (0..size)
            .map(|id| {
                let worker = PoolWorker {
                    id,
                    jobs: Arc::clone(&jobs),
                    runner: Arc::clone(&runner),
                };
                tokio::spawn(worker.run(token.clone()))
            })
            .collect();

        info!(workers = size, "Validation pool started");

        Self {
            intake: Some(tx),
            jobs,
            cache,
            shutdown,
            workers,
        }
    }

    /// Queue a request, or hand back the cached handle for identical work
    pub fn enqueue(&self, request: &ValidationRequest) -> Result<OutcomeHandle> {
        let intake = self
            .intake
            .as_ref()
            .ok_or_else(|| AppError::InvalidState("dispatcher is stopped".to_string()))?;

        match self.cache.get_or_reserve(request.cache_key()) {
            CacheLookup::Hit(handle) => {
                debug!(
                    document = %request.document,
                    command = %request.command,
                    "Reusing cached validation"
                );
                Ok(handle)
            }
            CacheLookup::Miss(handle, slot) => {
                intake
                    .send(Job {
                        key: request.cache_key(),
                        slot,
                    })
                    .map_err(|_| AppError::InvalidState("worker pool has exited".to_string()))?;
                Ok(handle)
            }
        }
    }

    /// Stop accepting work and wait until every queued job has run
    pub async fn drain_and_stop(&mut self) {
        // Closing the intake lets workers exit once the channel is empty
        self.intake = None;
        for handle in self.workers.drain(..) {
            if let Err(e) = handle.await {
                error!(error = ?e, "Validation worker failed");
            }
        }
        info!("Validation pool drained");
    }

    /// Stop accepting work, drop unstarted jobs, let running ones finish
    ///
    /// Does not wait for running processes; their outcomes land in handles
    /// nobody reads any more.
    pub fn cancel_and_stop(&mut self) {
        self.intake = None;
        self.shutdown.shutdown();
        // A worker blocked in recv holds the lock and discards on its own
        if let Ok(mut jobs) = self.jobs.try_lock() {
            let dropped = discard_queued(&mut jobs);
            if dropped > 0 {
                info!(dropped, "Cancelled unstarted validations");
            }
        }
        // Detach: running validators finish on their own
        self.workers.clear();
        info!("Validation pool cancelled");
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if !self.shutdown.is_shutdown() {
            self.shutdown.shutdown();
        }
    }
}

/// Close the channel and drop everything still queued; returns the count
fn discard_queued(jobs: &mut mpsc::UnboundedReceiver<Job>) -> usize {
    jobs.close();
    let mut dropped = 0;
    while let Ok(job) = jobs.try_recv() {
        // Dropping the slot resolves its handles as cancelled
        drop(job);
        dropped += 1;
    }
    dropped
}

/// Pool worker loop
struct PoolWorker {
    id: usize,
    jobs: JobReceiver,
    runner: Arc<dyn ProcessRunner>,
}

impl PoolWorker {
    async fn run(self, mut shutdown: ShutdownToken) {
        debug!(worker = self.id, "Validation worker started");
        loop {
            if shutdown.is_shutdown() {
                self.discard_pending().await;
                break;
            }

            let next = {
                let mut jobs = self.jobs.lock().await;
                tokio::select! {
                    biased;
                    _ = shutdown.wait() => None,
                    job = jobs.recv() => job,
                }
            };

            match next {
                Some(job) if shutdown.is_shutdown() => {
                    debug!(worker = self.id, command = %job.key.command, "Dropping unstarted job");
                }
                Some(job) => self.execute(job).await,
                // Intake closed and channel empty (drain), or shutdown signalled
                None => {
                    if shutdown.is_shutdown() {
                        self.discard_pending().await;
                    }
                    break;
                }
            }
        }
        debug!(worker = self.id, "Validation worker stopped");
    }

    /// Drop every queued job so its handles resolve as cancelled
    async fn discard_pending(&self) {
        let mut jobs = self.jobs.lock().await;
        let dropped = discard_queued(&mut jobs);
        if dropped > 0 {
            info!(worker = self.id, dropped, "Cancelled unstarted validations");
        }
    }

    /// Run one job with panic isolation and publish its outcome
    async fn execute(&self, job: Job) {
        let Job { key, slot } = job;
        let runner = Arc::clone(&self.runner);
        let command = key.command.clone();

        // Spawned so a panicking runner cannot take the worker down
        let handle =
            tokio::task::spawn(async move { runner.run(&key.content, &key.command).await });

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(worker = self.id, command = %command, error = ?join_err, "Validator task panicked");
                Outcome::RunError(RunError::Panicked(join_err.to_string()))
            }
        };

        debug!(
            worker = self.id,
            command = %command,
            success = outcome.is_success(),
            "Validation finished"
        );
        slot.resolve(outcome);
    }
}
