//! Stage status resolution for the run diagram.
//!
//! A node's status is derived from two independent inputs: the stage
//! execution record persisted for `(stage, attempt)`, and the run's live
//! pointer ([`LiveCursor`]). The record always takes precedence; the live
//! pointer only fills in `running` for work that has started but not yet
//! written a record. Historical attempts are therefore reconstructed from
//! records alone, since the cursor only ever points at the live attempt.

use serde::Serialize;

use crate::pipeline_stages::{DiagramNode, PipelineStage};
use crate::run_records::{RunSnapshot, ScoreRecord, StageRecord};
use crate::run_status::{is_unsuccessful_terminal, RUN_COMPLETED_PASS, RUN_RUNNING};
use crate::types::Attempt;

// ---------------------------------------------------------------------------
// Node status
// ---------------------------------------------------------------------------

/// Display status of a diagram node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Queued,
    Running,
    Ok,
    Error,
    Skipped,
}

impl NodeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "Queued",
            Self::Running => "Running",
            Self::Ok => "OK",
            Self::Error => "Error",
            Self::Skipped => "Skipped",
        }
    }
}

/// Map a recorded stage status onto a [`NodeStatus`].
///
/// The mapping is total and case-insensitive. Values outside the known
/// vocabulary map to `Queued`.
pub fn map_recorded_status(status: &str) -> NodeStatus {
    let status = status.trim().to_ascii_lowercase();
    match status.as_str() {
        "ok" | "completed" | "succeeded" => NodeStatus::Ok,
        "running" | "in_progress" => NodeStatus::Running,
        "skipped" => NodeStatus::Skipped,
        "cancelled" | "canceled" => NodeStatus::Error,
        s if s.contains("error") || s.contains("fail") => NodeStatus::Error,
        _ => NodeStatus::Queued,
    }
}

/// The gate outcome carried by a score record.
pub fn score_verdict(score: &ScoreRecord) -> NodeStatus {
    if score.pass_fail {
        NodeStatus::Ok
    } else {
        NodeStatus::Error
    }
}

// ---------------------------------------------------------------------------
// Live cursor
// ---------------------------------------------------------------------------

/// Where the live pipeline is executing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveCursor {
    pub stage: PipelineStage,
    pub attempt: Attempt,
}

impl LiveCursor {
    /// Derive the cursor from the run's live pointer.
    ///
    /// Only a `running` run has a cursor. A `current_stage` that does not
    /// name a known stage yields no cursor. The attempt is clamped to at
    /// least 1, matching how the executor numbers its first attempt.
    pub fn from_run(run: &RunSnapshot) -> Option<Self> {
        if run.status != RUN_RUNNING {
            return None;
        }
        let stage = PipelineStage::parse(&run.current_stage)?;
        Some(Self {
            stage,
            attempt: run.optimization_attempt.max(1),
        })
    }

    /// Whether the cursor is on `stage`, at any attempt.
    pub fn is_on(&self, stage: PipelineStage) -> bool {
        self.stage == stage
    }

    /// Whether the cursor is on `stage` at exactly `attempt`.
    pub fn is_at(&self, stage: PipelineStage, attempt: Attempt) -> bool {
        self.stage == stage && self.attempt == attempt
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Inputs for resolving one node at one attempt.
#[derive(Debug, Clone, Copy)]
pub struct StatusInputs<'a> {
    pub node: DiagramNode,
    /// The execution record for the node's backing stage at this attempt.
    pub record: Option<&'a StageRecord>,
    pub run: &'a RunSnapshot,
    pub cursor: Option<LiveCursor>,
    /// The attempt being evaluated.
    pub attempt: Attempt,
    /// The score record for this attempt, if any.
    pub score: Option<&'a ScoreRecord>,
}

/// Resolve the display status of a node.
///
/// Priority order:
///
/// 1. An execution record, when present, decides the status. For the
///    quality gate, a score record overrides a non-failing record status
///    with its verdict.
/// 2. `stage1_prompt` / `stage2_draft`: `running` while the cursor is on
///    the stage.
/// 3. `stage3_*`: all three views report `running` while the cursor is on
///    `stage3_upgrade` at this attempt.
/// 4. `stage4_background`: `running` while the cursor is on it at this
///    attempt, `skipped` if this attempt's score failed.
/// 5. `completed`: pinned to the run's `optimization_attempt`.
/// 6. `quality_gate`: score verdict if scored, else `running` while the
///    cursor is on it at this attempt.
///
/// Anything not matched is `queued`.
pub fn resolve_node_status(inputs: &StatusInputs<'_>) -> NodeStatus {
    let StatusInputs {
        node,
        record,
        run,
        cursor,
        attempt,
        score,
    } = *inputs;

    if let (Some(record), Some(_)) = (record, node.record_stage()) {
        let mapped = map_recorded_status(&record.status);
        return match (node, score) {
            (DiagramNode::QualityGate, Some(score))
                if matches!(mapped, NodeStatus::Ok | NodeStatus::Queued) =>
            {
                score_verdict(score)
            }
            _ => mapped,
        };
    }

    let cursor_at = |stage: PipelineStage| cursor.is_some_and(|c| c.is_at(stage, attempt));

    match node {
        DiagramNode::Stage1Prompt | DiagramNode::Stage2Draft => {
            let on_stage = node
                .record_stage()
                .is_some_and(|stage| cursor.is_some_and(|c| c.is_on(stage)));
            if on_stage {
                NodeStatus::Running
            } else {
                NodeStatus::Queued
            }
        }
        DiagramNode::Stage3Critique
        | DiagramNode::Stage3PromptUpgrade
        | DiagramNode::Stage3Generate => {
            if cursor_at(PipelineStage::Stage3Upgrade) {
                NodeStatus::Running
            } else {
                NodeStatus::Queued
            }
        }
        DiagramNode::Stage4Background => {
            if cursor_at(PipelineStage::Stage4Background) {
                NodeStatus::Running
            } else if score.is_some_and(|s| !s.pass_fail) {
                NodeStatus::Skipped
            } else {
                NodeStatus::Queued
            }
        }
        DiagramNode::Completed => completed_status(run, attempt),
        DiagramNode::QualityGate => {
            if let Some(score) = score {
                score_verdict(score)
            } else if cursor_at(PipelineStage::QualityGate) {
                NodeStatus::Running
            } else {
                NodeStatus::Queued
            }
        }
    }
}

/// Status of the terminal node when the diagram shows `attempt`.
pub fn completed_status(run: &RunSnapshot, attempt: Attempt) -> NodeStatus {
    if attempt != run.optimization_attempt {
        return NodeStatus::Queued;
    }
    if run.status == RUN_COMPLETED_PASS {
        NodeStatus::Ok
    } else if is_unsuccessful_terminal(&run.status) {
        NodeStatus::Error
    } else {
        NodeStatus::Queued
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_status::{
        RUN_COMPLETED_FAIL_THRESHOLD, RUN_FAILED_TECHNICAL, RUN_QUEUED,
    };

    fn running_run(stage: &str, attempt: Attempt) -> RunSnapshot {
        RunSnapshot {
            status: RUN_RUNNING.to_string(),
            current_stage: stage.to_string(),
            optimization_attempt: attempt,
            max_optimization_attempts: 3,
            ..Default::default()
        }
    }

    fn record(stage: &str, attempt: Attempt, status: &str) -> StageRecord {
        StageRecord {
            stage_name: stage.to_string(),
            attempt,
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn score(attempt: Attempt, value: f64, pass: bool) -> ScoreRecord {
        ScoreRecord {
            stage_name: "quality_gate".to_string(),
            attempt,
            score_0_100: value,
            pass_fail: pass,
            ..Default::default()
        }
    }

    fn resolve(
        node: DiagramNode,
        record: Option<&StageRecord>,
        run: &RunSnapshot,
        attempt: Attempt,
        score: Option<&ScoreRecord>,
    ) -> NodeStatus {
        resolve_node_status(&StatusInputs {
            node,
            record,
            run,
            cursor: LiveCursor::from_run(run),
            attempt,
            score,
        })
    }

    // -- map_recorded_status ------------------------------------------------

    #[test]
    fn maps_success_variants_to_ok() {
        assert_eq!(map_recorded_status("succeeded"), NodeStatus::Ok);
        assert_eq!(map_recorded_status("completed"), NodeStatus::Ok);
        assert_eq!(map_recorded_status("ok"), NodeStatus::Ok);
        assert_eq!(map_recorded_status("SUCCEEDED"), NodeStatus::Ok);
    }

    #[test]
    fn maps_in_flight_variants_to_running() {
        assert_eq!(map_recorded_status("running"), NodeStatus::Running);
        assert_eq!(map_recorded_status("in_progress"), NodeStatus::Running);
    }

    #[test]
    fn maps_failure_and_cancel_variants_to_error() {
        assert_eq!(map_recorded_status("failed"), NodeStatus::Error);
        assert_eq!(map_recorded_status("error"), NodeStatus::Error);
        assert_eq!(map_recorded_status("failed_technical"), NodeStatus::Error);
        assert_eq!(map_recorded_status("provider_error"), NodeStatus::Error);
        assert_eq!(map_recorded_status("cancelled"), NodeStatus::Error);
        assert_eq!(map_recorded_status("canceled"), NodeStatus::Error);
    }

    #[test]
    fn unknown_values_map_to_queued() {
        assert_eq!(map_recorded_status(""), NodeStatus::Queued);
        assert_eq!(map_recorded_status("pending"), NodeStatus::Queued);
        assert_eq!(map_recorded_status("weird-new-state"), NodeStatus::Queued);
    }

    #[test]
    fn skipped_maps_to_skipped() {
        assert_eq!(map_recorded_status("skipped"), NodeStatus::Skipped);
    }

    // -- LiveCursor ---------------------------------------------------------

    #[test]
    fn cursor_requires_running_run() {
        let mut run = running_run("stage3_upgrade", 2);
        assert_eq!(
            LiveCursor::from_run(&run),
            Some(LiveCursor {
                stage: PipelineStage::Stage3Upgrade,
                attempt: 2
            })
        );
        run.status = RUN_QUEUED.to_string();
        assert_eq!(LiveCursor::from_run(&run), None);
    }

    #[test]
    fn cursor_ignores_unknown_stage() {
        let run = running_run("stage9_unknown", 1);
        assert_eq!(LiveCursor::from_run(&run), None);
    }

    #[test]
    fn cursor_attempt_clamped_to_one() {
        let run = running_run("stage1_prompt", 0);
        assert_eq!(LiveCursor::from_run(&run).unwrap().attempt, 1);
    }

    // -- Rule 1: record precedence ------------------------------------------

    #[test]
    fn succeeded_record_wins_over_live_pointer() {
        let run = running_run("stage4_background", 1);
        let rec = record("stage4_background", 1, "succeeded");
        assert_eq!(
            resolve(DiagramNode::Stage4Background, Some(&rec), &run, 1, None),
            NodeStatus::Ok
        );

        let run = running_run("stage1_prompt", 1);
        let rec = record("stage1_prompt", 0, "succeeded");
        assert_eq!(
            resolve(DiagramNode::Stage1Prompt, Some(&rec), &run, 1, None),
            NodeStatus::Ok
        );
    }

    #[test]
    fn running_record_reports_running_without_pointer() {
        let run = RunSnapshot::default();
        let rec = record("stage3_upgrade", 1, "running");
        assert_eq!(
            resolve(DiagramNode::Stage3Generate, Some(&rec), &run, 1, None),
            NodeStatus::Running
        );
    }

    // -- Rule 2: attempt-independent stages ---------------------------------

    #[test]
    fn attempt_independent_stage_running_on_any_attempt() {
        let run = running_run("stage2_draft", 0);
        assert_eq!(
            resolve(DiagramNode::Stage2Draft, None, &run, 3, None),
            NodeStatus::Running
        );
        assert_eq!(
            resolve(DiagramNode::Stage1Prompt, None, &run, 3, None),
            NodeStatus::Queued
        );
    }

    // -- Rule 3: stage 3 composite ------------------------------------------

    #[test]
    fn stage3_views_run_together_at_live_attempt() {
        let run = running_run("stage3_upgrade", 2);
        for node in [
            DiagramNode::Stage3Critique,
            DiagramNode::Stage3PromptUpgrade,
            DiagramNode::Stage3Generate,
        ] {
            assert_eq!(resolve(node, None, &run, 2, None), NodeStatus::Running);
            assert_eq!(resolve(node, None, &run, 1, None), NodeStatus::Queued);
        }
    }

    // -- Rule 4: background stage -------------------------------------------

    #[test]
    fn background_skipped_after_failing_score() {
        let run = running_run("stage3_upgrade", 2);
        let failed = score(1, 60.0, false);
        assert_eq!(
            resolve(DiagramNode::Stage4Background, None, &run, 1, Some(&failed)),
            NodeStatus::Skipped
        );
    }

    #[test]
    fn background_queued_after_passing_score_without_record() {
        let run = running_run("quality_gate", 1);
        let passed = score(1, 97.0, true);
        assert_eq!(
            resolve(DiagramNode::Stage4Background, None, &run, 1, Some(&passed)),
            NodeStatus::Queued
        );
    }

    #[test]
    fn background_running_at_live_attempt() {
        let run = running_run("stage4_background", 1);
        assert_eq!(
            resolve(DiagramNode::Stage4Background, None, &run, 1, None),
            NodeStatus::Running
        );
        assert_eq!(
            resolve(DiagramNode::Stage4Background, None, &run, 2, None),
            NodeStatus::Queued
        );
    }

    // -- Rule 5: completed --------------------------------------------------

    #[test]
    fn completed_pinned_to_run_attempt() {
        let mut run = RunSnapshot {
            status: RUN_COMPLETED_PASS.to_string(),
            optimization_attempt: 2,
            ..Default::default()
        };
        assert_eq!(completed_status(&run, 2), NodeStatus::Ok);
        assert_eq!(completed_status(&run, 1), NodeStatus::Queued);

        run.status = RUN_COMPLETED_FAIL_THRESHOLD.to_string();
        assert_eq!(completed_status(&run, 2), NodeStatus::Error);

        run.status = RUN_FAILED_TECHNICAL.to_string();
        assert_eq!(completed_status(&run, 2), NodeStatus::Error);
        assert_eq!(completed_status(&run, 3), NodeStatus::Queued);

        run.status = RUN_RUNNING.to_string();
        assert_eq!(completed_status(&run, 2), NodeStatus::Queued);
    }

    // -- Rule 6: quality gate -----------------------------------------------

    #[test]
    fn quality_gate_uses_score_verdict() {
        let run = RunSnapshot::default();
        let failed = score(1, 60.0, false);
        let passed = score(1, 97.0, true);
        assert_eq!(
            resolve(DiagramNode::QualityGate, None, &run, 1, Some(&failed)),
            NodeStatus::Error
        );
        assert_eq!(
            resolve(DiagramNode::QualityGate, None, &run, 1, Some(&passed)),
            NodeStatus::Ok
        );
    }

    #[test]
    fn quality_gate_ok_record_with_failing_score_is_error() {
        let run = RunSnapshot::default();
        let rec = record("quality_gate", 1, "ok");
        let failed = score(1, 60.0, false);
        assert_eq!(
            resolve(DiagramNode::QualityGate, Some(&rec), &run, 1, Some(&failed)),
            NodeStatus::Error
        );
    }

    #[test]
    fn quality_gate_failed_record_stays_error_even_if_scored() {
        let run = RunSnapshot::default();
        let rec = record("quality_gate", 1, "failed");
        let passed = score(1, 97.0, true);
        assert_eq!(
            resolve(DiagramNode::QualityGate, Some(&rec), &run, 1, Some(&passed)),
            NodeStatus::Error
        );
    }

    #[test]
    fn quality_gate_running_at_live_attempt() {
        let run = running_run("quality_gate", 2);
        assert_eq!(
            resolve(DiagramNode::QualityGate, None, &run, 2, None),
            NodeStatus::Running
        );
        assert_eq!(
            resolve(DiagramNode::QualityGate, None, &run, 1, None),
            NodeStatus::Queued
        );
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(NodeStatus::Ok.label(), "OK");
        assert_eq!(NodeStatus::Queued.as_str(), "queued");
    }
}
