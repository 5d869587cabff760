//! Repository for the `assets` table.

use aac_core::types::DbId;
use sqlx::PgPool;

use crate::models::asset::{Asset, CreateAsset};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, run_id, stage_name, attempt, file_name, abs_path, mime_type, sha256, \
    width, height, origin_url, model_name, created_at";

/// Provides CRUD operations for generated image assets.
pub struct AssetRepo;

impl AssetRepo {
    /// Insert an asset, returning the created row.
    pub async fn create(pool: &PgPool, body: &CreateAsset) -> Result<Asset, sqlx::Error> {
        let query = format!(
            "INSERT INTO assets
                (run_id, stage_name, attempt, file_name, abs_path, mime_type, sha256,
                 width, height, origin_url, model_name)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'image/jpeg'), $7, $8, $9,
                 COALESCE($10, ''), COALESCE($11, ''))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(body.run_id)
            .bind(&body.stage_name)
            .bind(body.attempt)
            .bind(&body.file_name)
            .bind(&body.abs_path)
            .bind(&body.mime_type)
            .bind(&body.sha256)
            .bind(body.width)
            .bind(body.height)
            .bind(&body.origin_url)
            .bind(&body.model_name)
            .fetch_one(pool)
            .await
    }

    /// Find an asset by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Asset>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM assets WHERE id = $1");
        sqlx::query_as::<_, Asset>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all assets for a run in write order.
    pub async fn list_by_run(pool: &PgPool, run_id: DbId) -> Result<Vec<Asset>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM assets
             WHERE run_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Asset>(&query)
            .bind(run_id)
            .fetch_all(pool)
            .await
    }
}
