//! Rebuild outbox repository.

use sqlx::PgPool;

use folio_core::error::{AppError, ErrorKind};
use folio_core::result::AppResult;
use folio_entity::node::NodeRef;
use folio_entity::outbox::RebuildJob;

/// Repository for queued subtree rebuilds.
#[derive(Debug, Clone)]
pub struct OutboxRepository {
    pool: PgPool,
}

impl OutboxRepository {
    /// Create a new outbox repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enqueue a rebuild request for a subtree root.
    pub async fn enqueue(&self, node: NodeRef, max_attempts: i32) -> AppResult<RebuildJob> {
        sqlx::query_as::<_, RebuildJob>(
            "INSERT INTO rebuild_outbox (node_id, node_kind, max_attempts) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(node.id)
        .bind(node.kind)
        .bind(max_attempts)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to enqueue rebuild", e))
    }

    /// Claim the oldest pending job, bumping its attempt counter. Uses
    /// `FOR UPDATE SKIP LOCKED` so concurrent workers never double-claim.
    pub async fn claim_next(&self) -> AppResult<Option<RebuildJob>> {
        sqlx::query_as::<_, RebuildJob>(
            "UPDATE rebuild_outbox SET attempts = attempts + 1 \
             WHERE id = (SELECT id FROM rebuild_outbox \
                 WHERE processed_at IS NULL AND attempts < max_attempts \
                 ORDER BY requested_at, id LIMIT 1 FOR UPDATE SKIP LOCKED) \
             RETURNING *",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to claim rebuild", e))
    }

    /// Mark a job as successfully processed.
    pub async fn complete(&self, job_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE rebuild_outbox SET processed_at = NOW() WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to complete rebuild job", e)
            })?;
        Ok(())
    }

    /// Record a failed attempt. The job stays claimable until its
    /// attempts are exhausted.
    pub async fn fail(&self, job_id: i64, error: &str) -> AppResult<()> {
        sqlx::query("UPDATE rebuild_outbox SET last_error = $2 WHERE id = $1")
            .bind(job_id)
            .bind(error)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record rebuild failure", e)
            })?;
        Ok(())
    }

    /// Number of jobs still waiting for a successful run.
    pub async fn pending_count(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM rebuild_outbox \
             WHERE processed_at IS NULL AND attempts < max_attempts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count outbox", e))?;
        Ok(count as u64)
    }

    /// Jobs that exhausted their attempts without succeeding. Surfaced
    /// to operators; these need manual investigation.
    pub async fn dead_jobs(&self) -> AppResult<Vec<RebuildJob>> {
        sqlx::query_as::<_, RebuildJob>(
            "SELECT * FROM rebuild_outbox \
             WHERE processed_at IS NULL AND attempts >= max_attempts \
             ORDER BY requested_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list dead jobs", e))
    }
}
