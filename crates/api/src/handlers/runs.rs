//! Handlers for run detail, attempt listing and the run diagram.

use aac_core::error::CoreError;
use aac_core::run_diagram::{self, RunDiagram};
use aac_core::run_records::RunDetail;
use aac_core::types::{Attempt, DbId};
use aac_db::repositories::RunDetailRepo;
use aac_db::DbPool;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /runs/{id}/diagram`.
#[derive(Debug, Deserialize)]
pub struct DiagramParams {
    pub attempt: Option<Attempt>,
}

/// Load a run's detail or fail with `NotFound`.
async fn load_detail(pool: &DbPool, id: DbId) -> AppResult<RunDetail> {
    let detail = RunDetailRepo::load(pool, id)
        .await?
        .ok_or(CoreError::NotFound { entity: "Run", id })?;
    Ok(detail)
}

/// GET /api/v1/runs/{id}
pub async fn get_run(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RunDetail>>> {
    let detail = load_detail(&state.pool, id).await?;
    Ok(Json(DataResponse { data: detail }))
}

/// GET /api/v1/runs/{id}/attempts
///
/// Distinct attempts with recorded activity, ascending. Never empty.
pub async fn list_attempts(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Attempt>>>> {
    let detail = load_detail(&state.pool, id).await?;
    Ok(Json(DataResponse {
        data: aac_core::list_attempts(&detail),
    }))
}

/// GET /api/v1/runs/{id}/diagram?attempt=N
///
/// Projects the run onto the pipeline graph for one attempt. An absent
/// `attempt` selects the first; a non-positive or non-numeric one is
/// rejected.
pub async fn get_diagram(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    params: Result<Query<DiagramParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<RunDiagram>>> {
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if let Some(attempt) = params.attempt {
        if attempt < 1 {
            return Err(CoreError::Validation(format!(
                "attempt must be at least 1, got {attempt}"
            ))
            .into());
        }
    }

    let detail = load_detail(&state.pool, id).await?;
    let diagram = run_diagram::project(&detail, params.attempt);

    tracing::debug!(
        run_id = id,
        attempt = diagram.selected_attempt,
        run_status = %detail.run.status,
        current_stage = %detail.run.current_stage,
        "Projected run diagram",
    );

    Ok(Json(DataResponse { data: diagram }))
}
