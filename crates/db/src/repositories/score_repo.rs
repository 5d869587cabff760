//! Repository for the `scores` table.

use aac_core::types::DbId;
use sqlx::PgPool;

use crate::models::score::{CreateScore, Score};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, run_id, stage_name, attempt, score_0_100, pass_fail, rubric_json, created_at";

/// Provides CRUD operations for quality gate scores.
pub struct ScoreRepo;

impl ScoreRepo {
    /// Insert a score, returning the created row.
    pub async fn create(pool: &PgPool, body: &CreateScore) -> Result<Score, sqlx::Error> {
        let query = format!(
            "INSERT INTO scores (run_id, attempt, score_0_100, pass_fail, rubric_json)
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Score>(&query)
            .bind(body.run_id)
            .bind(body.attempt)
            .bind(body.score_0_100)
            .bind(body.pass_fail)
            .bind(&body.rubric_json)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Score>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM scores WHERE id = $1");
        sqlx::query_as::<_, Score>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all scores for a run in write order.
    pub async fn list_by_run(pool: &PgPool, run_id: DbId) -> Result<Vec<Score>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM scores
             WHERE run_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Score>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }
}
