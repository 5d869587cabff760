//! Loads a run together with all of its records.

use aac_core::run_records::RunDetail;
use aac_core::types::DbId;
use sqlx::PgPool;

use super::{AssetRepo, PromptRepo, RunRepo, ScoreRepo, StageResultRepo};

/// Assembles the [`RunDetail`] snapshot read by the diagram projection.
pub struct RunDetailRepo;

impl RunDetailRepo {
    /// Load the run row and every stage, prompt, asset and score record.
    ///
    /// Returns `None` if the run does not exist. Record lists keep write
    /// order so that later rows supersede earlier ones during lookup.
    pub async fn load(pool: &PgPool, run_id: DbId) -> Result<Option<RunDetail>, sqlx::Error> {
        let Some(run) = RunRepo::find_by_id(pool, run_id).await? else {
            return Ok(None);
        };

        let stages = StageResultRepo::list_by_run(pool, run_id).await?;
        let prompts = PromptRepo::list_by_run(pool, run_id).await?;
        let assets = AssetRepo::list_by_run(pool, run_id).await?;
        let scores = ScoreRepo::list_by_run(pool, run_id).await?;

        tracing::debug!(
            run_id,
            stages = stages.len(),
            prompts = prompts.len(),
            assets = assets.len(),
            scores = scores.len(),
            "Loaded run detail",
        );

        Ok(Some(RunDetail {
            run: run.into(),
            stages: stages.into_iter().map(Into::into).collect(),
            prompts: prompts.into_iter().map(Into::into).collect(),
            assets: assets.into_iter().map(Into::into).collect(),
            scores: scores.into_iter().map(Into::into).collect(),
        }))
    }
}
