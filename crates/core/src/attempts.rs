//! Attempt index: which optimization attempts exist for a run.
//!
//! Feeds the attempt selector and the per-attempt summary strip.

use std::collections::BTreeSet;

use crate::pipeline_stages::{ASSET_STAGE3_UPGRADED, ASSET_STAGE4_WHITE_BG, STAGE3_UPGRADE};
use crate::run_records::RunDetail;
use crate::types::Attempt;

/// The attempt shown when nothing has been recorded yet.
pub const FIRST_ATTEMPT: Attempt = 1;

/// List the distinct attempts that have any recorded activity, ascending.
///
/// An attempt counts when it is referenced by a stage record with
/// `attempt > 0`, a `stage3_upgrade` prompt, a score, or a
/// `stage3_upgraded` / `stage4_white_bg` asset. The run's own
/// `optimization_attempt` is included when positive. A run with no
/// activity still reports `[1]`.
pub fn list_attempts(detail: &RunDetail) -> Vec<Attempt> {
    let stage_attempts = detail.stages.iter().map(|s| s.attempt);

    let prompt_attempts = detail
        .prompts
        .iter()
        .filter(|p| p.stage_name == STAGE3_UPGRADE)
        .map(|p| p.attempt);

    let score_attempts = detail.scores.iter().map(|s| s.attempt);

    let asset_attempts = detail
        .assets
        .iter()
        .filter(|a| a.stage_name == ASSET_STAGE3_UPGRADED || a.stage_name == ASSET_STAGE4_WHITE_BG)
        .map(|a| a.attempt);

    let attempts: BTreeSet<Attempt> = stage_attempts
        .chain(prompt_attempts)
        .chain(score_attempts)
        .chain(asset_attempts)
        .chain(std::iter::once(detail.run.optimization_attempt))
        .filter(|attempt| *attempt > 0)
        .collect();

    if attempts.is_empty() {
        vec![FIRST_ATTEMPT]
    } else {
        attempts.into_iter().collect()
    }
}

/// Normalize a requested attempt: absent or non-positive means the first.
pub fn normalize_selected_attempt(selected: Option<Attempt>) -> Attempt {
    match selected {
        Some(attempt) if attempt >= FIRST_ATTEMPT => attempt,
        _ => FIRST_ATTEMPT,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_records::{AssetRecord, PromptRecord, RunSnapshot, ScoreRecord, StageRecord};

    #[test]
    fn empty_detail_lists_first_attempt() {
        assert_eq!(list_attempts(&RunDetail::default()), vec![1]);
    }

    #[test]
    fn attempt_independent_records_do_not_create_attempts() {
        let detail = RunDetail {
            stages: vec![
                StageRecord {
                    stage_name: "stage1_prompt".into(),
                    attempt: 0,
                    ..Default::default()
                },
                StageRecord {
                    stage_name: "stage2_draft".into(),
                    attempt: 0,
                    ..Default::default()
                },
            ],
            prompts: vec![PromptRecord {
                stage_name: "stage1_prompt".into(),
                attempt: 0,
                ..Default::default()
            }],
            assets: vec![AssetRecord {
                stage_name: "stage2_draft".into(),
                attempt: 0,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(list_attempts(&detail), vec![1]);
    }

    #[test]
    fn collects_from_every_record_kind_sorted_and_deduplicated() {
        let detail = RunDetail {
            run: RunSnapshot {
                optimization_attempt: 5,
                ..Default::default()
            },
            stages: vec![
                StageRecord {
                    stage_name: "quality_gate".into(),
                    attempt: 3,
                    ..Default::default()
                },
                StageRecord {
                    stage_name: "stage3_upgrade".into(),
                    attempt: 1,
                    ..Default::default()
                },
            ],
            prompts: vec![PromptRecord {
                stage_name: "stage3_upgrade".into(),
                attempt: 2,
                ..Default::default()
            }],
            scores: vec![ScoreRecord {
                attempt: 3,
                ..Default::default()
            }],
            assets: vec![AssetRecord {
                stage_name: "stage4_white_bg".into(),
                attempt: 4,
                ..Default::default()
            }],
        };
        assert_eq!(list_attempts(&detail), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn ignores_prompts_and_assets_from_other_stages() {
        let detail = RunDetail {
            prompts: vec![PromptRecord {
                stage_name: "stage1_prompt".into(),
                attempt: 7,
                ..Default::default()
            }],
            assets: vec![AssetRecord {
                stage_name: "stage2_draft".into(),
                attempt: 8,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(list_attempts(&detail), vec![1]);
    }

    #[test]
    fn includes_live_attempt_before_any_record() {
        let detail = RunDetail {
            run: RunSnapshot {
                optimization_attempt: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(list_attempts(&detail), vec![2]);
    }

    #[test]
    fn negative_attempts_are_ignored() {
        let detail = RunDetail {
            scores: vec![ScoreRecord {
                attempt: -1,
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(list_attempts(&detail), vec![1]);
    }

    #[test]
    fn selected_attempt_normalization() {
        assert_eq!(normalize_selected_attempt(None), 1);
        assert_eq!(normalize_selected_attempt(Some(0)), 1);
        assert_eq!(normalize_selected_attempt(Some(-3)), 1);
        assert_eq!(normalize_selected_attempt(Some(4)), 4);
    }
}
