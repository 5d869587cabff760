//! Repository for the `prompts` table.

use aac_core::types::DbId;
use sqlx::PgPool;

use crate::models::prompt::{CreatePrompt, Prompt};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, run_id, stage_name, attempt, prompt_text, needs_person, source, \
    raw_response_json, created_at";

/// Provides CRUD operations for prompts.
pub struct PromptRepo;

impl PromptRepo {
    /// Insert a prompt, returning the created row.
    pub async fn create(pool: &PgPool, body: &CreatePrompt) -> Result<Prompt, sqlx::Error> {
        let query = format!(
            "INSERT INTO prompts
                (run_id, stage_name, attempt, prompt_text, needs_person, source, raw_response_json)
             VALUES ($1, $2, $3, $4, COALESCE($5, ''), COALESCE($6, 'assistant'), COALESCE($7, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(body.run_id)
            .bind(&body.stage_name)
            .bind(body.attempt)
            .bind(&body.prompt_text)
            .bind(&body.needs_person)
            .bind(&body.source)
            .bind(&body.raw_response_json)
            .fetch_one(pool)
            .await
    }

    /// Find a record by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Prompt>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM prompts WHERE id = $1");
        sqlx::query_as::<_, Prompt>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all prompts for a run in write order.
    pub async fn list_by_run(pool: &PgPool, run_id: DbId) -> Result<Vec<Prompt>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prompts
             WHERE run_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Prompt>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }
}
