//! Repository for the `stage_results` table.

use aac_core::types::DbId;
use sqlx::PgPool;

use crate::models::stage_result::{StageResult, UpsertStageResult};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, run_id, stage_name, attempt, status, request_json, response_json, error_detail, created_at";

/// Provides upsert and listing for stage execution records.
pub struct StageResultRepo;

impl StageResultRepo {
    /// Insert or replace the record for `(run_id, stage_name, attempt)`.
    ///
    /// A stage that is re-run under the same attempt overwrites status and
    /// payloads; `created_at` is kept from the first write.
    pub async fn upsert(
        pool: &PgPool,
        body: &UpsertStageResult,
    ) -> Result<StageResult, sqlx::Error> {
        let query = format!(
            "INSERT INTO stage_results
                (run_id, stage_name, attempt, status, request_json, response_json, error_detail)
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb), COALESCE($6, '{{}}'::jsonb), COALESCE($7, ''))
             ON CONFLICT ON CONSTRAINT uq_stage_results_run_stage_attempt DO UPDATE SET
                status = EXCLUDED.status,
                request_json = EXCLUDED.request_json,
                response_json = EXCLUDED.response_json,
                error_detail = EXCLUDED.error_detail
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StageResult>(&query)
            .bind(body.run_id)
            .bind(&body.stage_name)
            .bind(body.attempt)
            .bind(&body.status)
            .bind(&body.request_json)
            .bind(&body.response_json)
            .bind(&body.error_detail)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StageResult>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM stage_results WHERE id = $1");
        sqlx::query_as::<_, StageResult>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all stage records for a run in write order.
    pub async fn list_by_run(pool: &PgPool, run_id: DbId) -> Result<Vec<StageResult>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stage_results
             WHERE run_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, StageResult>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }
}
