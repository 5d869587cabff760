//! Handlers for the static pipeline description.

use aac_core::pipeline_stages::{FlowEdge, StageContract, FLOW_EDGES, STAGE_CONTRACTS};
use axum::Json;
use serde::Serialize;

use crate::response::DataResponse;

/// Node contracts and edges of the pipeline graph.
#[derive(Debug, Serialize)]
pub struct PipelineGraph {
    pub stages: &'static [StageContract],
    pub edges: &'static [FlowEdge],
}

/// GET /api/v1/pipeline/stages
pub async fn get_stages() -> Json<DataResponse<PipelineGraph>> {
    Json(DataResponse {
        data: PipelineGraph {
            stages: &STAGE_CONTRACTS,
            edges: &FLOW_EDGES,
        },
    })
}
