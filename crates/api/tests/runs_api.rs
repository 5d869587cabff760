//! Integration tests for the run detail, attempt and diagram endpoints.

mod common;

use aac_db::models::run::{CreateRun, UpdateRunProgress};
use aac_db::models::score::CreateScore;
use aac_db::models::stage_result::UpsertStageResult;
use aac_db::repositories::{RunRepo, ScoreRepo, StageResultRepo};
use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::{body_json, get};
use serde_json::{json, Value};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn record_stage(pool: &PgPool, run_id: i64, stage_name: &str, attempt: i32, status: &str) {
    StageResultRepo::upsert(
        pool,
        &UpsertStageResult {
            run_id,
            stage_name: stage_name.to_string(),
            attempt,
            status: status.to_string(),
            request_json: None,
            response_json: None,
            error_detail: None,
        },
    )
    .await
    .unwrap();
}

/// A run on its second attempt: attempt 1 scored 60 and failed, and the
/// live pointer is inside stage 3 of attempt 2.
async fn seed_retrying_run(pool: &PgPool) -> i64 {
    let run = RunRepo::create(
        pool,
        &CreateRun {
            entry_id: 1,
            quality_threshold: Some(90),
            max_optimization_attempts: Some(3),
        },
    )
    .await
    .unwrap();

    record_stage(pool, run.id, "stage1_prompt", 0, "ok").await;
    record_stage(pool, run.id, "stage2_draft", 0, "ok").await;
    record_stage(pool, run.id, "stage3_upgrade", 1, "ok").await;
    record_stage(pool, run.id, "quality_gate", 1, "ok").await;

    ScoreRepo::create(
        pool,
        &CreateScore {
            run_id: run.id,
            attempt: 1,
            score_0_100: 60.0,
            pass_fail: false,
            rubric_json: Some(json!({"rubric": {"explanation": "busy background"}})),
        },
    )
    .await
    .unwrap();

    RunRepo::update_progress(
        pool,
        run.id,
        &UpdateRunProgress {
            status: "running".to_string(),
            current_stage: "stage3_upgrade".to_string(),
            optimization_attempt: 2,
        },
    )
    .await
    .unwrap();

    run.id
}

fn node<'a>(diagram: &'a Value, id: &str) -> &'a Value {
    diagram["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|n| n["id"] == id)
        .unwrap_or_else(|| panic!("node {id} missing"))
}

fn edge<'a>(diagram: &'a Value, from: &str, to: &str) -> &'a Value {
    diagram["edges"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["from"] == from && e["to"] == to)
        .unwrap_or_else(|| panic!("edge {from} -> {to} missing"))
}

// ---------------------------------------------------------------------------
// Run detail and attempts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn get_run_returns_detail_envelope(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, &format!("/api/v1/runs/{run_id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["run"]["id"], run_id);
    assert_eq!(json["data"]["run"]["current_stage"], "stage3_upgrade");
    assert_eq!(json["data"]["stages"].as_array().unwrap().len(), 4);
    assert_eq!(json["data"]["scores"][0]["score_0_100"], 60.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_run_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);

    for path in [
        "/api/v1/runs/999999",
        "/api/v1/runs/999999/attempts",
        "/api/v1/runs/999999/diagram",
    ] {
        let response = get(app.clone(), path).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");

        let json = body_json(response).await;
        assert_eq!(json["code"], "NOT_FOUND");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn attempts_include_live_attempt(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, &format!("/api/v1/runs/{run_id}/attempts")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"], json!([1, 2]));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn fresh_run_lists_first_attempt(pool: PgPool) {
    let run = RunRepo::create(
        &pool,
        &CreateRun {
            entry_id: 5,
            quality_threshold: None,
            max_optimization_attempts: None,
        },
    )
    .await
    .unwrap();
    let app = common::build_test_app(pool);

    let json = body_json(get(app, &format!("/api/v1/runs/{}/attempts", run.id)).await).await;
    assert_eq!(json["data"], json!([1]));
}

// ---------------------------------------------------------------------------
// Diagram
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_for_live_attempt_shows_stage3_running(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, &format!("/api/v1/runs/{run_id}/diagram?attempt=2")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let diagram = body_json(response).await["data"].clone();
    assert_eq!(diagram["selectedAttempt"], 2);
    assert_eq!(diagram["nodes"].as_array().unwrap().len(), 8);
    assert_eq!(diagram["edges"].as_array().unwrap().len(), 9);

    assert_eq!(node(&diagram, "stage1_prompt")["status"], "ok");
    assert_eq!(node(&diagram, "stage2_draft")["status"], "ok");
    assert_eq!(node(&diagram, "stage3_critique")["status"], "running");
    assert_eq!(node(&diagram, "stage3_prompt_upgrade")["status"], "running");
    assert_eq!(node(&diagram, "stage3_generate")["status"], "running");
    assert_eq!(node(&diagram, "quality_gate")["status"], "queued");
    assert_eq!(node(&diagram, "stage4_background")["status"], "queued");
    assert_eq!(node(&diagram, "completed")["status"], "queued");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_for_failed_attempt_shows_history(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, &format!("/api/v1/runs/{run_id}/diagram?attempt=1")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let diagram = body_json(response).await["data"].clone();
    assert_eq!(diagram["selectedAttempt"], 1);
    assert_eq!(node(&diagram, "stage3_generate")["status"], "ok");
    assert_eq!(node(&diagram, "quality_gate")["status"], "error");
    assert_eq!(node(&diagram, "stage4_background")["status"], "skipped");
    assert_eq!(node(&diagram, "completed")["status"], "queued");

    assert_eq!(edge(&diagram, "quality_gate", "stage3_critique")["active"], true);
    assert_eq!(edge(&diagram, "quality_gate", "completed")["active"], false);
    assert_eq!(edge(&diagram, "quality_gate", "stage4_background")["active"], false);

    let summaries = diagram["attemptSummaries"].as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["qualityStatus"], "error");
    assert_eq!(summaries[0]["passFail"], false);
    assert_eq!(summaries[0]["explanation"], "busy background");
    assert_eq!(summaries[1]["stage3Status"], "running");
    assert_matches!(summaries[1]["score"], Value::Null);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_without_attempt_selects_first(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(get(app, &format!("/api/v1/runs/{run_id}/diagram")).await).await;
    assert_eq!(json["data"]["selectedAttempt"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_rejects_non_positive_attempt(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    for attempt in [0, -2] {
        let response = get(
            app.clone(),
            &format!("/api/v1/runs/{run_id}/diagram?attempt={attempt}"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_for_attempt_beyond_records_is_queued(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let json = body_json(get(app, &format!("/api/v1/runs/{run_id}/diagram?attempt=9")).await).await;
    let diagram = &json["data"];

    assert_eq!(node(diagram, "stage3_critique")["status"], "queued");
    assert_eq!(node(diagram, "quality_gate")["status"], "queued");
    // Attempt-independent stages are shared by every attempt.
    assert_eq!(node(diagram, "stage1_prompt")["status"], "ok");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn diagram_rejects_non_numeric_attempt_as_json(pool: PgPool) {
    let run_id = seed_retrying_run(&pool).await;
    let app = common::build_test_app(pool);

    let response = get(app, &format!("/api/v1/runs/{run_id}/diagram?attempt=abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}
