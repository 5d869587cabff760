//! Run diagram projection.
//!
//! Rebuilds the display state of one run from its persisted records: the
//! eight pipeline nodes evaluated at a selected attempt, the static flow
//! edges annotated with which retry path the attempt took, and a summary
//! row for every known attempt.
//!
//! [`project`] is a pure function of its inputs. It is called on every
//! poll against a fresh snapshot, never fails, and returns identical
//! output for identical input.

use serde::Serialize;

use crate::attempts::{list_attempts, normalize_selected_attempt};
use crate::pipeline_stages::{
    DiagramNode, EdgeKind, FlowEdge, ASSET_STAGE2_DRAFT, ASSET_STAGE3_UPGRADED,
    ASSET_STAGE4_WHITE_BG, ATTEMPT_INDEPENDENT, FLOW_EDGES, STAGE1_PROMPT, STAGE3_UPGRADE,
};
use crate::run_records::{
    safe_object, AssetRecord, PromptRecord, RecordIndex, RunDetail, RunSnapshot, ScoreRecord,
    StageRecord,
};
use crate::run_status::{RUN_COMPLETED_FAIL_THRESHOLD, RUN_COMPLETED_PASS, RUN_FAILED_TECHNICAL};
use crate::stage_status::{resolve_node_status, LiveCursor, NodeStatus, StatusInputs};
use crate::types::{Attempt, Timestamp};

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Model shown for the vision calls when the record does not name one.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o-mini";

/// Model label shown for the prompt upgrade sub-stage.
pub const PROMPT_UPGRADE_MODEL: &str = "OpenAI Assistant";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// The full projection returned to the display layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDiagram {
    /// The attempt the nodes were evaluated at.
    pub selected_attempt: Attempt,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
    pub attempt_summaries: Vec<AttemptSummary>,
}

/// One diagram node evaluated at the selected attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: DiagramNode,
    pub label: &'static str,
    pub status: NodeStatus,
    pub status_label: &'static str,
    pub subtitle: String,
    pub provider: &'static str,
    pub inputs: &'static [&'static str],
    pub expected: &'static [&'static str],
    pub retry_policy: &'static str,
    /// Attempt the node's records are keyed under (0 for stages 1 and 2).
    pub attempt: Attempt,
    pub stage_status: String,
    pub stage_created_at: Option<Timestamp>,
    pub stage_error_detail: String,
    pub prompt: Option<PromptRecord>,
    pub model: String,
    pub asset: Option<AssetRecord>,
    pub score: Option<ScoreRecord>,
    pub score_rubric: JsonObject,
    pub request_json: JsonObject,
    pub response_json: JsonObject,
    pub request_keys: Vec<String>,
    pub response_keys: Vec<String>,
}

/// A static flow edge plus whether the selected attempt took it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeView {
    pub from: DiagramNode,
    pub to: DiagramNode,
    pub kind: EdgeKind,
    pub label: &'static str,
    pub active: bool,
}

/// Per-attempt roll-up for the attempt history strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptSummary {
    pub attempt: Attempt,
    pub stage3_status: NodeStatus,
    pub quality_status: NodeStatus,
    pub stage4_status: NodeStatus,
    pub score: Option<f64>,
    pub pass_fail: Option<bool>,
    /// Scorer explanation, empty when unscored.
    pub explanation: String,
    pub failure_tags: Vec<String>,
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Project a run snapshot into diagram state at `selected_attempt`.
///
/// An absent or non-positive attempt evaluates attempt 1.
pub fn project(detail: &RunDetail, selected_attempt: Option<Attempt>) -> RunDiagram {
    let attempt = normalize_selected_attempt(selected_attempt);
    let index = RecordIndex::build(detail);
    let cursor = LiveCursor::from_run(&detail.run);

    let nodes = DiagramNode::ALL
        .iter()
        .map(|node| build_node(*node, detail, &index, cursor, attempt))
        .collect();

    RunDiagram {
        selected_attempt: attempt,
        nodes,
        edges: build_edges(&detail.run, index.score(attempt), attempt),
        attempt_summaries: build_attempt_summaries(detail, &index, cursor),
    }
}

/// Resolve `node` at `attempt` using the indexed records.
fn node_status(
    node: DiagramNode,
    run: &RunSnapshot,
    index: &RecordIndex<'_>,
    cursor: Option<LiveCursor>,
    attempt: Attempt,
) -> NodeStatus {
    let record = node
        .record_stage()
        .and_then(|stage| index.stage(stage.as_str(), node.record_attempt(attempt)));

    resolve_node_status(&StatusInputs {
        node,
        record,
        run,
        cursor,
        attempt,
        score: index.score(attempt),
    })
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Records and payloads attached to one node before status resolution.
struct NodeSources<'a> {
    record: Option<&'a StageRecord>,
    prompt: Option<&'a PromptRecord>,
    asset: Option<&'a AssetRecord>,
    score: Option<&'a ScoreRecord>,
    model: String,
    /// Sub-view payloads for nodes that present part of a shared record.
    request_override: Option<JsonObject>,
    response_override: Option<JsonObject>,
}

fn build_node(
    node: DiagramNode,
    detail: &RunDetail,
    index: &RecordIndex<'_>,
    cursor: Option<LiveCursor>,
    attempt: Attempt,
) -> NodeView {
    let sources = collect_sources(node, index, attempt);
    let status = node_status(node, &detail.run, index, cursor, attempt);
    let contract = node.contract();

    let request_json = sources
        .request_override
        .unwrap_or_else(|| safe_object(sources.record.map(|r| &r.request_json)));
    let response_json = sources
        .response_override
        .unwrap_or_else(|| safe_object(sources.record.map(|r| &r.response_json)));

    NodeView {
        id: node,
        label: contract.label,
        status,
        status_label: status.label(),
        subtitle: node_subtitle(node, &detail.run, sources.score, attempt),
        provider: contract.provider,
        inputs: contract.inputs,
        expected: contract.expected,
        retry_policy: contract.retry_policy,
        attempt: node.record_attempt(attempt),
        stage_status: sources.record.map(|r| r.status.clone()).unwrap_or_default(),
        stage_created_at: sources.record.and_then(|r| r.created_at),
        stage_error_detail: sources
            .record
            .map(|r| r.error_detail.clone())
            .unwrap_or_default(),
        prompt: sources.prompt.cloned(),
        model: sources.model,
        asset: sources.asset.cloned(),
        score: sources.score.cloned(),
        score_rubric: safe_object(sources.score.map(|s| &s.rubric_json)),
        request_keys: request_json.keys().cloned().collect(),
        response_keys: response_json.keys().cloned().collect(),
        request_json,
        response_json,
    }
}

/// Look up the records each node displays.
///
/// Stages 1 and 2 read attempt 0. The stage 3 sub-views all read the
/// single `stage3_upgrade` record and expose different slices of its
/// payloads.
fn collect_sources<'a>(
    node: DiagramNode,
    index: &RecordIndex<'a>,
    attempt: Attempt,
) -> NodeSources<'a> {
    let record = node
        .record_stage()
        .and_then(|stage| index.stage(stage.as_str(), node.record_attempt(attempt)));

    let stage1_prompt = index.prompt(STAGE1_PROMPT, ATTEMPT_INDEPENDENT);
    let stage3_prompt = index.prompt(STAGE3_UPGRADE, attempt);
    let stage2_asset = index.asset(ASSET_STAGE2_DRAFT, ATTEMPT_INDEPENDENT);
    let stage3_asset = index.asset(ASSET_STAGE3_UPGRADED, attempt);
    let stage4_asset = index.asset(ASSET_STAGE4_WHITE_BG, attempt);
    let score = index.score(attempt);

    let stage3 = Stage3Payloads::read(index.stage(STAGE3_UPGRADE, attempt));
    let asset_model = |asset: Option<&AssetRecord>| {
        asset.map(|a| a.model_name.clone()).unwrap_or_default()
    };

    let base = NodeSources {
        record,
        prompt: None,
        asset: None,
        score: None,
        model: String::new(),
        request_override: None,
        response_override: None,
    };

    match node {
        DiagramNode::Stage1Prompt => NodeSources {
            prompt: stage1_prompt,
            ..base
        },
        DiagramNode::Stage2Draft => NodeSources {
            prompt: stage1_prompt,
            asset: stage2_asset,
            model: asset_model(stage2_asset),
            ..base
        },
        DiagramNode::Stage3Critique => NodeSources {
            prompt: stage3_prompt,
            asset: stage2_asset,
            model: stage3.critique_model(),
            request_override: Some(stage3.sub_request("upgrade_prompt_request")),
            response_override: Some(stage3.sub_response("analysis")),
            ..base
        },
        DiagramNode::Stage3PromptUpgrade => NodeSources {
            prompt: stage3_prompt,
            model: PROMPT_UPGRADE_MODEL.to_string(),
            request_override: Some(stage3.sub_request("upgrade_prompt_request")),
            response_override: Some(stage3.sub_response("assistant")),
            ..base
        },
        DiagramNode::Stage3Generate => {
            let generation_model = stage3.generation_model();
            let mut request = JsonObject::new();
            request.insert(
                "prompt".to_string(),
                stage3_prompt
                    .map(|p| p.prompt_text.clone())
                    .unwrap_or_default()
                    .into(),
            );
            request.insert("model".to_string(), generation_model.clone().into());

            let model = match stage3_asset {
                Some(asset) if !asset.model_name.is_empty() => asset.model_name.clone(),
                _ => generation_model,
            };
            NodeSources {
                prompt: stage3_prompt,
                asset: stage3_asset,
                model,
                request_override: Some(request),
                response_override: Some(stage3.sub_response("generation")),
                ..base
            }
        }
        DiagramNode::QualityGate => {
            let model = record
                .and_then(|r| r.request_json.get("quality_model_selected"))
                .and_then(|v| v.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or(DEFAULT_VISION_MODEL)
                .to_string();
            NodeSources {
                prompt: stage3_prompt,
                asset: stage3_asset,
                score,
                model,
                ..base
            }
        }
        DiagramNode::Stage4Background => NodeSources {
            prompt: stage3_prompt,
            asset: stage4_asset,
            score,
            model: asset_model(stage4_asset),
            ..base
        },
        DiagramNode::Completed => NodeSources {
            asset: stage4_asset.or(stage3_asset),
            score,
            ..base
        },
    }
}

/// Request/response objects of the shared `stage3_upgrade` record.
struct Stage3Payloads {
    request: JsonObject,
    response: JsonObject,
}

impl Stage3Payloads {
    fn read(record: Option<&StageRecord>) -> Self {
        Self {
            request: safe_object(record.map(|r| &r.request_json)),
            response: safe_object(record.map(|r| &r.response_json)),
        }
    }

    fn sub_request(&self, key: &str) -> JsonObject {
        safe_object(self.request.get(key))
    }

    fn sub_response(&self, key: &str) -> JsonObject {
        safe_object(self.response.get(key))
    }

    fn text(map: &JsonObject, key: &str) -> Option<String> {
        map.get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    fn critique_model(&self) -> String {
        Self::text(&self.request, "critique_model_selected")
            .unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string())
    }

    fn generation_model(&self) -> String {
        Self::text(&self.response, "generation_model")
            .or_else(|| Self::text(&self.request, "generation_model_selected"))
            .unwrap_or_default()
    }
}

fn node_subtitle(
    node: DiagramNode,
    run: &RunSnapshot,
    score: Option<&ScoreRecord>,
    attempt: Attempt,
) -> String {
    match node {
        DiagramNode::Completed => {
            let pinned = attempt == run.optimization_attempt;
            let text = match run.status.as_str() {
                RUN_COMPLETED_PASS if pinned => "Pass",
                RUN_COMPLETED_FAIL_THRESHOLD if pinned => "Fail threshold",
                RUN_FAILED_TECHNICAL if pinned => "Technical failure",
                _ => "Pending",
            };
            text.to_string()
        }
        DiagramNode::QualityGate => match score {
            Some(score) => format!(
                "Score {}{}",
                score.score_0_100,
                if score.pass_fail { " (pass)" } else { " (fail)" }
            ),
            None => String::new(),
        },
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Annotate the static edges with the path the attempt's score implies.
///
/// A failing score activates the loop edge while attempts remain and the
/// exhausted branch otherwise. A passing score activates the edge into
/// background normalization.
fn build_edges(run: &RunSnapshot, score: Option<&ScoreRecord>, attempt: Attempt) -> Vec<EdgeView> {
    let verdict = score.map(|s| s.pass_fail);
    let attempts_remain = attempt < run.attempt_budget();

    FLOW_EDGES
        .iter()
        .map(|edge: &FlowEdge| {
            let active = match edge.kind {
                EdgeKind::Loop => verdict == Some(false) && attempts_remain,
                EdgeKind::Branch => verdict == Some(false) && !attempts_remain,
                EdgeKind::Forward => {
                    edge.from == DiagramNode::QualityGate
                        && edge.to == DiagramNode::Stage4Background
                        && verdict == Some(true)
                }
            };
            EdgeView {
                from: edge.from,
                to: edge.to,
                kind: edge.kind,
                label: edge.label,
                active,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Attempt summaries
// ---------------------------------------------------------------------------

fn build_attempt_summaries(
    detail: &RunDetail,
    index: &RecordIndex<'_>,
    cursor: Option<LiveCursor>,
) -> Vec<AttemptSummary> {
    list_attempts(detail)
        .into_iter()
        .map(|attempt| {
            let status = |node| node_status(node, &detail.run, index, cursor, attempt);
            let score = index.score(attempt);
            AttemptSummary {
                attempt,
                stage3_status: status(DiagramNode::Stage3Critique),
                quality_status: status(DiagramNode::QualityGate),
                stage4_status: status(DiagramNode::Stage4Background),
                score: score.map(|s| s.score_0_100),
                pass_fail: score.map(|s| s.pass_fail),
                explanation: score.map(ScoreRecord::explanation).unwrap_or_default(),
                failure_tags: score.map(ScoreRecord::failure_tags).unwrap_or_default(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
