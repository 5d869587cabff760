//! Run models and DTOs.

use aac_core::run_records::RunSnapshot;
use aac_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `runs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub entry_id: DbId,
    pub status: String,
    pub current_stage: String,
    pub retry_from_stage: String,
    pub quality_score: Option<f64>,
    pub quality_threshold: i32,
    pub optimization_attempt: i32,
    pub max_optimization_attempts: i32,
    pub technical_retry_count: i32,
    pub error_detail: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for submitting a new run.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRun {
    pub entry_id: DbId,
    pub quality_threshold: Option<i32>,
    pub max_optimization_attempts: Option<i32>,
}

/// DTO for moving the live pointer of a run.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRunProgress {
    pub status: String,
    pub current_stage: String,
    pub optimization_attempt: i32,
}

impl From<Run> for RunSnapshot {
    fn from(run: Run) -> Self {
        Self {
            id: run.id,
            status: run.status,
            current_stage: run.current_stage,
            optimization_attempt: run.optimization_attempt,
            max_optimization_attempts: run.max_optimization_attempts,
            quality_threshold: run.quality_threshold,
            quality_score: run.quality_score,
            error_detail: run.error_detail,
            created_at: Some(run.created_at),
            updated_at: Some(run.updated_at),
        }
    }
}
