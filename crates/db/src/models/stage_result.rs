//! Stage execution record models and DTOs.

use aac_core::run_records::StageRecord;
use aac_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `stage_results` table.
///
/// Unique per `(run_id, stage_name, attempt)`; a rewrite under the same
/// key replaces status and payloads in place.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StageResult {
    pub id: DbId,
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub status: String,
    pub request_json: serde_json::Value,
    pub response_json: serde_json::Value,
    pub error_detail: String,
    pub created_at: Timestamp,
}

/// DTO for recording a stage execution.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertStageResult {
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub status: String,
    pub request_json: Option<serde_json::Value>,
    pub response_json: Option<serde_json::Value>,
    pub error_detail: Option<String>,
}

impl From<StageResult> for StageRecord {
    fn from(row: StageResult) -> Self {
        Self {
            id: row.id,
            stage_name: row.stage_name,
            attempt: row.attempt,
            status: row.status,
            request_json: row.request_json,
            response_json: row.response_json,
            error_detail: row.error_detail,
            created_at: Some(row.created_at),
        }
    }
}
