//! Repository for the `runs` table.

use aac_core::types::DbId;
use sqlx::PgPool;

use crate::models::run::{CreateRun, Run, UpdateRunProgress};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, entry_id, status, current_stage, retry_from_stage, \
    quality_score, quality_threshold, optimization_attempt, max_optimization_attempts, \
    technical_retry_count, error_detail, created_at, updated_at";

/// Provides CRUD operations for runs.
pub struct RunRepo;

impl RunRepo {
    /// Insert a new queued run, returning the created row.
    ///
    /// Threshold and attempt budget fall back to the column defaults when
    /// not supplied.
    pub async fn create(pool: &PgPool, body: &CreateRun) -> Result<Run, sqlx::Error> {
        let query = format!(
            "INSERT INTO runs (entry_id, quality_threshold, max_optimization_attempts)
             VALUES ($1, COALESCE($2, 90), COALESCE($3, 3))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(body.entry_id)
            .bind(body.quality_threshold)
            .bind(body.max_optimization_attempts)
            .fetch_one(pool)
            .await
    }

    /// Find a run by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE id = $1");
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List runs for an entry, newest first.
    pub async fn list_by_entry(pool: &PgPool, entry_id: DbId) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs
             WHERE entry_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(entry_id)
            .fetch_all(pool)
            .await
    }

    /// Move the live pointer. Returns `None` if the run does not exist.
    pub async fn update_progress(
        pool: &PgPool,
        id: DbId,
        body: &UpdateRunProgress,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!(
            "UPDATE runs SET
                status = $2,
                current_stage = $3,
                optimization_attempt = $4,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .bind(&body.status)
            .bind(&body.current_stage)
            .bind(body.optimization_attempt)
            .fetch_optional(pool)
            .await
    }

    /// Record the quality score of the latest attempt.
    pub async fn set_quality_score(
        pool: &PgPool,
        id: DbId,
        score: f64,
    ) -> Result<Option<Run>, sqlx::Error> {
        let query = format!(
            "UPDATE runs SET quality_score = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .bind(score)
            .fetch_optional(pool)
            .await
    }
}
