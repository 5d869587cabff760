//! Prompt models and DTOs.

use aac_core::run_records::PromptRecord;
use aac_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `prompts` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Prompt {
    pub id: DbId,
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub prompt_text: String,
    pub needs_person: String,
    pub source: String,
    pub raw_response_json: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub prompt_text: String,
    pub needs_person: Option<String>,
    pub source: Option<String>,
    pub raw_response_json: Option<serde_json::Value>,
}

impl From<Prompt> for PromptRecord {
    fn from(row: Prompt) -> Self {
        Self {
            id: row.id,
            stage_name: row.stage_name,
            attempt: row.attempt,
            prompt_text: row.prompt_text,
            needs_person: row.needs_person,
            source: row.source,
            raw_response_json: row.raw_response_json,
            created_at: Some(row.created_at),
        }
    }
}
