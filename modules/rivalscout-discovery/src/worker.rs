//! Worker runtime: bounded-concurrency claim loop over the durable queue.
//!
//! Each worker runs one job synchronously end to end under a wall-clock
//! budget. On a timeout the run is marked failed with "timeout" and the job
//! is discarded (the run is already terminal — a retry would be rejected).
//! Shutdown stops claiming and drains in-flight jobs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use rivalscout_common::{DiscoveryContext, RunStatus};
use rivalscout_store::{JobQueue, QueueJob};

use crate::pipeline::DiscoveryPipeline;
use crate::service::DISCOVER_JOB_KIND;
use crate::traits::PipelineStore;

/// How long an idle worker sleeps before polling the queue again.
const IDLE_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Jobs locked longer than this are assumed orphaned and reclaimed.
const STALE_JOB_AFTER: Duration = Duration::from_secs(15 * 60);
/// Cadence of the stale-job reclaim sweep.
const RECLAIM_INTERVAL: Duration = Duration::from_secs(30);

pub struct WorkerPool {
    queue: JobQueue,
    pipeline: Arc<DiscoveryPipeline>,
    store: Arc<dyn PipelineStore>,
    concurrency: usize,
    job_wallclock: Duration,
    shutdown: watch::Receiver<bool>,
}

impl WorkerPool {
    pub fn new(
        queue: JobQueue,
        pipeline: Arc<DiscoveryPipeline>,
        store: Arc<dyn PipelineStore>,
        concurrency: usize,
        job_wallclock: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            queue,
            pipeline,
            store,
            concurrency: concurrency.max(1),
            job_wallclock,
            shutdown,
        }
    }

    /// Run until shutdown is signalled, then drain in-flight jobs.
    pub async fn run(self) {
        info!(concurrency = self.concurrency, "Worker pool starting");

        let mut tasks = JoinSet::new();

        // Stale-job reclaim sweep — one per pool, not per worker.
        {
            let queue = self.queue.clone();
            let mut shutdown = self.shutdown.clone();
            tasks.spawn(async move {
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(RECLAIM_INTERVAL) => {
                            if let Err(e) = queue.reclaim_stale(STALE_JOB_AFTER).await {
                                warn!(error = %e, "Stale job reclaim failed");
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            });
        }

        for worker_index in 0..self.concurrency {
            let queue = self.queue.clone();
            let pipeline = self.pipeline.clone();
            let store = self.store.clone();
            let shutdown = self.shutdown.clone();
            let wallclock = self.job_wallclock;
            tasks.spawn(async move {
                worker_loop(worker_index, queue, pipeline, store, wallclock, shutdown).await;
            });
        }

        while tasks.join_next().await.is_some() {}
        info!("Worker pool drained");
    }
}

async fn worker_loop(
    worker_index: usize,
    queue: JobQueue,
    pipeline: Arc<DiscoveryPipeline>,
    store: Arc<dyn PipelineStore>,
    wallclock: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let worker_id = format!("worker-{worker_index}");
    info!(worker = worker_id.as_str(), "Worker started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        match queue.claim(&worker_id).await {
            Ok(Some(job)) => {
                process_job(&queue, &pipeline, &*store, wallclock, &job).await;
            }
            Ok(None) => {
                // Queue empty; nap until there might be work or we shut down.
                tokio::select! {
                    _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                    _ = shutdown.changed() => {}
                }
            }
            Err(e) => {
                warn!(worker = worker_id.as_str(), error = %e, "Claim failed");
                tokio::time::sleep(IDLE_POLL_INTERVAL).await;
            }
        }
    }

    info!(worker = worker_id.as_str(), "Worker stopped");
}

async fn process_job(
    queue: &JobQueue,
    pipeline: &DiscoveryPipeline,
    store: &dyn PipelineStore,
    wallclock: Duration,
    job: &QueueJob,
) {
    if job.kind != DISCOVER_JOB_KIND {
        warn!(job_id = %job.id, kind = job.kind.as_str(), "Unknown job kind, discarding");
        let _ = queue.discard(job.id, "unknown job kind").await;
        return;
    }

    let ctx: DiscoveryContext = match serde_json::from_value(job.payload.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            error!(job_id = %job.id, error = %e, "Malformed job payload, discarding");
            let _ = queue.discard(job.id, &format!("malformed payload: {e}")).await;
            return;
        }
    };

    info!(job_id = %job.id, run_id = %ctx.run_id, attempt = job.attempts, "Processing discovery job");

    match tokio::time::timeout(wallclock, pipeline.run(&ctx)).await {
        Ok(Ok(stats)) => {
            info!(run_id = %ctx.run_id, "{stats}");
            if let Err(e) = queue.complete(job.id).await {
                warn!(job_id = %job.id, error = %e, "Failed to mark job complete");
            }
        }
        Ok(Err(e)) => {
            let message = format!("{e:#}");
            error!(run_id = %ctx.run_id, error = message.as_str(), "Discovery run failed");
            // Mark the run failed before recording the job failure so the
            // queue never retries a terminal run without a status.
            if let Err(status_err) = store
                .update_run_status(ctx.run_id, RunStatus::Failed, None, Some(&message))
                .await
            {
                warn!(run_id = %ctx.run_id, error = %status_err, "Failed to mark run failed");
            }
            if let Err(queue_err) = queue.fail(job, &message).await {
                warn!(job_id = %job.id, error = %queue_err, "Failed to record job failure");
            }
        }
        Err(_elapsed) => {
            warn!(run_id = %ctx.run_id, budget_secs = wallclock.as_secs(), "Job exceeded wall-clock budget");
            if let Err(e) = store
                .update_run_status(ctx.run_id, RunStatus::Failed, None, Some("timeout"))
                .await
            {
                warn!(run_id = %ctx.run_id, error = %e, "Failed to mark timed-out run failed");
            }
            if let Err(e) = queue.discard(job.id, "timeout").await {
                warn!(job_id = %job.id, error = %e, "Failed to discard timed-out job");
            }
        }
    }
}
