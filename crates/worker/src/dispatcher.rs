//! Background job dispatcher.
//!
//! Polls for pending jobs every `poll_interval` and runs them through the
//! pipeline. Claiming uses `SELECT FOR UPDATE SKIP LOCKED` via
//! [`JobRepo::claim_next`] to prevent double-dispatch across worker
//! processes; concurrent runs on one worker are bounded by a semaphore.
//! Delivery is at-least-once: a redelivered job for already-terminal
//! evidence is detected by the processor's state transition and completed
//! as a no-op.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use custodia_db::models::job::{Job, JOB_TYPE_PROCESS_VIDEO};
use custodia_db::repositories::JobRepo;
use custodia_db::DbPool;
use custodia_pipeline::VideoProcessor;

/// Default polling interval for the dispatcher loop.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on concurrently running pipeline runs per worker.
const DEFAULT_MAX_CONCURRENT_RUNS: usize = 2;

/// Background job dispatcher.
///
/// A single long-lived Tokio task that claims pending jobs and spawns one
/// pipeline run per claimed evidence.
pub struct JobDispatcher {
    pool: DbPool,
    processor: Arc<VideoProcessor>,
    poll_interval: Duration,
    run_slots: Arc<Semaphore>,
}

impl JobDispatcher {
    /// Create a dispatcher with the default poll interval and run bound.
    pub fn new(pool: DbPool, processor: Arc<VideoProcessor>) -> Self {
        Self::with_limits(pool, processor, DEFAULT_POLL_INTERVAL, DEFAULT_MAX_CONCURRENT_RUNS)
    }

    pub fn with_limits(
        pool: DbPool,
        processor: Arc<VideoProcessor>,
        poll_interval: Duration,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            pool,
            processor,
            poll_interval,
            run_slots: Arc::new(Semaphore::new(max_concurrent_runs.max(1))),
        }
    }

    /// Run the dispatcher loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Job dispatcher started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job dispatcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.try_dispatch().await {
                        tracing::error!(error = %e, "Dispatch cycle failed");
                    }
                }
            }
        }
    }

    /// One dispatch cycle: claim jobs while run slots are free.
    async fn try_dispatch(&self) -> Result<(), sqlx::Error> {
        loop {
            let Ok(permit) = self.run_slots.clone().try_acquire_owned() else {
                // All run slots busy; check again next tick.
                return Ok(());
            };

            let Some(job) = JobRepo::claim_next(&self.pool).await? else {
                return Ok(());
            };

            tracing::info!(job_id = job.id, video_id = job.video_id, job_type = %job.job_type, "Job claimed");

            let pool = self.pool.clone();
            let processor = self.processor.clone();
            tokio::spawn(async move {
                let _permit = permit;
                Self::run_job(pool, processor, job).await;
            });
        }
    }

    /// Execute one claimed job and record its terminal state.
    async fn run_job(pool: DbPool, processor: Arc<VideoProcessor>, job: Job) {
        if job.job_type != JOB_TYPE_PROCESS_VIDEO {
            tracing::warn!(job_id = job.id, job_type = %job.job_type, "Unknown job type");
            if let Err(e) = JobRepo::fail(&pool, job.id, "unknown job type").await {
                tracing::error!(job_id = job.id, error = %e, "Failed to mark job as failed");
            }
            return;
        }

        match processor.process(job.video_id).await {
            Ok(summary) => {
                tracing::info!(
                    job_id = job.id,
                    video_id = job.video_id,
                    faces = summary.faces_detected,
                    objects = summary.objects_detected,
                    "Job completed",
                );
                if let Err(e) = JobRepo::complete(&pool, job.id).await {
                    tracing::error!(job_id = job.id, error = %e, "Failed to mark job completed");
                }
            }
            Err(error) if error.is_noop_redelivery() => {
                // The evidence already reached a terminal state (or another
                // worker holds it); at-least-once delivery makes this benign.
                tracing::warn!(
                    job_id = job.id,
                    video_id = job.video_id,
                    error = %error,
                    "Redelivered job skipped",
                );
                if let Err(e) = JobRepo::complete(&pool, job.id).await {
                    tracing::error!(job_id = job.id, error = %e, "Failed to mark job completed");
                }
            }
            Err(error) => {
                tracing::error!(
                    job_id = job.id,
                    video_id = job.video_id,
                    error = %error,
                    "Job failed",
                );
                if let Err(e) = JobRepo::fail(&pool, job.id, &error.to_string()).await {
                    tracing::error!(job_id = job.id, error = %e, "Failed to mark job as failed");
                }
            }
        }
    }
}
