//! Integration tests for the static pipeline description endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, get};
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn pipeline_stages_lists_contracts_and_edges(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/pipeline/stages").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let stages = json["data"]["stages"].as_array().unwrap();
    let edges = json["data"]["edges"].as_array().unwrap();

    assert_eq!(stages.len(), 8);
    assert_eq!(stages[0]["id"], "stage1_prompt");
    assert_eq!(stages[0]["retryPolicy"], "API retry + stage retry");
    assert_eq!(stages[7]["id"], "completed");

    assert_eq!(edges.len(), 9);
    assert!(edges
        .iter()
        .any(|e| e["kind"] == "loop" && e["from"] == "quality_gate" && e["to"] == "stage3_critique"));
}
