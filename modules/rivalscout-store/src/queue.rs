//! Durable job queue over Postgres.
//!
//! Workers claim jobs with `FOR UPDATE SKIP LOCKED`, so concurrent workers
//! never double-claim. Attempts are counted at claim time; a failed job goes
//! back to pending with exponential backoff until its attempts are spent.
//! `reclaim_stale` recovers jobs whose worker died mid-flight.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;

#[derive(Debug, Clone, FromRow)]
pub struct QueueJob {
    pub id: Uuid,
    pub kind: String,
    pub payload: Value,
    pub attempts: i32,
    pub max_attempts: i32,
}

impl QueueJob {
    pub fn attempts_remaining(&self) -> bool {
        self.attempts < self.max_attempts
    }
}

#[derive(Clone)]
pub struct JobQueue {
    pool: PgPool,
    backoff_base: Duration,
}

impl JobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            backoff_base: Duration::from_secs(5),
        }
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Enqueue a job, due immediately. Returns the job id.
    pub async fn enqueue(&self, kind: &str, payload: &Value, max_attempts: u32) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO queue_jobs
                (id, kind, payload, status, attempts, max_attempts, run_at, created_at, updated_at)
             VALUES ($1, $2, $3, 'pending', 0, $4, now(), now(), now())
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(kind)
        .bind(payload)
        .bind(max_attempts as i32)
        .fetch_one(&self.pool)
        .await?;

        info!(job_id = %id, kind, "Enqueued job");
        Ok(id)
    }

    /// Atomically claim the oldest due job. Returns `None` when the queue
    /// is empty. The claim increments `attempts`.
    pub async fn claim(&self, worker_id: &str) -> Result<Option<QueueJob>> {
        let job = sqlx::query_as::<_, QueueJob>(
            "UPDATE queue_jobs
             SET status = 'running', locked_at = now(), locked_by = $1,
                 attempts = attempts + 1, updated_at = now()
             WHERE id = (
                 SELECT id FROM queue_jobs
                 WHERE status = 'pending' AND run_at <= now()
                 ORDER BY run_at, created_at
                 LIMIT 1
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING id, kind, payload, attempts, max_attempts",
        )
        .bind(worker_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref job) = job {
            debug!(job_id = %job.id, kind = job.kind.as_str(), attempt = job.attempts, "Claimed job");
        }
        Ok(job)
    }

    pub async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE queue_jobs
             SET status = 'completed', locked_by = NULL, locked_at = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a failure. Jobs with attempts remaining return to pending with
    /// exponential backoff (base × 2^(attempt-1)); spent jobs go to failed.
    pub async fn fail(&self, job: &QueueJob, error: &str) -> Result<()> {
        if job.attempts_remaining() {
            let exponent = (job.attempts - 1).max(0).min(16) as u32;
            let delay = self.backoff_base * 2u32.saturating_pow(exponent);
            let run_at =
                Utc::now() + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

            warn!(
                job_id = %job.id,
                attempt = job.attempts,
                retry_in_secs = delay.as_secs(),
                error,
                "Job failed, scheduling retry"
            );

            sqlx::query(
                "UPDATE queue_jobs
                 SET status = 'pending', run_at = $2, last_error = $3,
                     locked_by = NULL, locked_at = NULL, updated_at = now()
                 WHERE id = $1",
            )
            .bind(job.id)
            .bind(run_at)
            .bind(error)
            .execute(&self.pool)
            .await?;
        } else {
            warn!(job_id = %job.id, attempts = job.attempts, error, "Job failed permanently");
            self.discard(job.id, error).await?;
        }
        Ok(())
    }

    /// Mark a job failed with no further retries.
    pub async fn discard(&self, job_id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE queue_jobs
             SET status = 'failed', last_error = $2,
                 locked_by = NULL, locked_at = NULL, updated_at = now()
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Recover jobs locked longer than `stale` (worker crashed mid-flight).
    /// Jobs with attempts remaining go back to pending; spent jobs fail.
    pub async fn reclaim_stale(&self, stale: Duration) -> Result<u64> {
        let cutoff =
            Utc::now() - chrono::Duration::from_std(stale).unwrap_or_else(|_| chrono::Duration::zero());

        let failed = sqlx::query(
            "UPDATE queue_jobs
             SET status = 'failed', last_error = 'worker lost', locked_by = NULL,
                 locked_at = NULL, updated_at = now()
             WHERE status = 'running' AND locked_at < $1 AND attempts >= max_attempts",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let requeued = sqlx::query(
            "UPDATE queue_jobs
             SET status = 'pending', run_at = now(), locked_by = NULL,
                 locked_at = NULL, updated_at = now()
             WHERE status = 'running' AND locked_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let total = failed + requeued;
        if total > 0 {
            info!(requeued, failed, "Reclaimed stale jobs");
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(attempts: i32, max_attempts: i32) -> QueueJob {
        QueueJob {
            id: Uuid::new_v4(),
            kind: "discover".to_string(),
            payload: serde_json::json!({}),
            attempts,
            max_attempts,
        }
    }

    #[test]
    fn attempts_remaining_boundary() {
        assert!(job(1, 2).attempts_remaining());
        assert!(!job(2, 2).attempts_remaining());
        assert!(!job(3, 2).attempts_remaining());
    }
}
