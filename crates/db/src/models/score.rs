//! Quality gate score models and DTOs.

use aac_core::run_records::ScoreRecord;
use aac_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `scores` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Score {
    pub id: DbId,
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub score_0_100: f64,
    pub pass_fail: bool,
    pub rubric_json: serde_json::Value,
    pub created_at: Timestamp,
}

/// DTO for inserting a score.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScore {
    pub run_id: DbId,
    pub attempt: i32,
    pub score_0_100: f64,
    pub pass_fail: bool,
    pub rubric_json: Option<serde_json::Value>,
}

impl From<Score> for ScoreRecord {
    fn from(row: Score) -> Self {
        Self {
            id: row.id,
            stage_name: row.stage_name,
            attempt: row.attempt,
            score_0_100: row.score_0_100,
            pass_fail: row.pass_fail,
            rubric_json: row.rubric_json,
            created_at: Some(row.created_at),
        }
    }
}
