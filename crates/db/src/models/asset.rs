//! Generated image asset models and DTOs.

use aac_core::run_records::AssetRecord;
use aac_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assets` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Asset {
    pub id: DbId,
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub file_name: String,
    pub abs_path: String,
    pub mime_type: String,
    pub sha256: String,
    pub width: i32,
    pub height: i32,
    pub origin_url: String,
    pub model_name: String,
    pub created_at: Timestamp,
}

/// DTO for inserting an asset.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAsset {
    pub run_id: DbId,
    pub stage_name: String,
    pub attempt: i32,
    pub file_name: String,
    pub abs_path: String,
    pub mime_type: Option<String>,
    pub sha256: String,
    pub width: i32,
    pub height: i32,
    pub origin_url: Option<String>,
    pub model_name: Option<String>,
}

/// The on-disk path stays server side; the projection only sees the
/// file name.
impl From<Asset> for AssetRecord {
    fn from(row: Asset) -> Self {
        Self {
            id: row.id,
            stage_name: row.stage_name,
            attempt: row.attempt,
            file_name: row.file_name,
            mime_type: row.mime_type,
            sha256: row.sha256,
            width: row.width,
            height: row.height,
            origin_url: row.origin_url,
            model_name: row.model_name,
            created_at: Some(row.created_at),
        }
    }
}
