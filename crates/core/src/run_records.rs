//! Run detail snapshot: the run row plus its stage, prompt, asset and
//! score records, as read by the diagram projection.
//!
//! The snapshot is whatever the storage layer returned on the last poll.
//! Every field defaults when absent so that a partially written or
//! malformed record still deserializes; such records simply fail to match
//! any `(stage_name, attempt)` lookup.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::{Attempt, DbId, Timestamp};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// Read an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// The run row, including the live pointer (`status`, `current_stage`,
/// `optimization_attempt`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSnapshot {
    #[serde(deserialize_with = "null_as_default")]
    pub id: DbId,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(deserialize_with = "null_as_default")]
    pub current_stage: String,
    #[serde(deserialize_with = "null_as_default")]
    pub optimization_attempt: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub max_optimization_attempts: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub quality_threshold: i32,
    pub quality_score: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub error_detail: String,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl RunSnapshot {
    /// Total number of attempts the run may make.
    pub fn attempt_budget(&self) -> Attempt {
        self.max_optimization_attempts.max(0).saturating_add(1)
    }
}

/// One stage execution, unique per `(stage_name, attempt)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: DbId,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attempt: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub status: String,
    pub request_json: serde_json::Value,
    pub response_json: serde_json::Value,
    #[serde(deserialize_with = "null_as_default")]
    pub error_detail: String,
    pub created_at: Option<Timestamp>,
}

/// A textual prompt produced by a stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: DbId,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attempt: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub prompt_text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub needs_person: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source: String,
    pub raw_response_json: serde_json::Value,
    pub created_at: Option<Timestamp>,
}

/// A generated image artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: DbId,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attempt: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub file_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mime_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sha256: String,
    #[serde(deserialize_with = "null_as_default")]
    pub width: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub height: i32,
    #[serde(deserialize_with = "null_as_default")]
    pub origin_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub model_name: String,
    pub created_at: Option<Timestamp>,
}

/// Quality gate outcome for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub id: DbId,
    #[serde(deserialize_with = "null_as_default")]
    pub stage_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub attempt: Attempt,
    #[serde(deserialize_with = "null_as_default")]
    pub score_0_100: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub pass_fail: bool,
    pub rubric_json: serde_json::Value,
    pub created_at: Option<Timestamp>,
}

impl ScoreRecord {
    /// The parsed rubric, found under `rubric` or at the top level.
    fn rubric(&self) -> &serde_json::Value {
        match self.rubric_json.get("rubric") {
            Some(inner) if inner.is_object() => inner,
            _ => &self.rubric_json,
        }
    }

    /// Scorer explanation, empty when not provided.
    pub fn explanation(&self) -> String {
        self.rubric()
            .get("explanation")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    /// Failure tags reported by the scorer. Non-string entries are skipped.
    pub fn failure_tags(&self) -> Vec<String> {
        self.rubric()
            .get("failure_tags")
            .and_then(|v| v.as_array())
            .map(|tags| {
                tags.iter()
                    .filter_map(|t| t.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Everything the projection reads for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub run: RunSnapshot,
    #[serde(deserialize_with = "null_as_default")]
    pub stages: Vec<StageRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub prompts: Vec<PromptRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub assets: Vec<AssetRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub scores: Vec<ScoreRecord>,
}

// ---------------------------------------------------------------------------
// Keyed lookup
// ---------------------------------------------------------------------------

/// Borrowed `(stage_name, attempt)` lookup over a [`RunDetail`].
///
/// Records are inserted in log order, so a later record under the same
/// key supersedes an earlier one. Records with an empty `stage_name` are
/// not indexed.
#[derive(Debug, Default)]
pub struct RecordIndex<'a> {
    stages: BTreeMap<(&'a str, Attempt), &'a StageRecord>,
    prompts: BTreeMap<(&'a str, Attempt), &'a PromptRecord>,
    assets: BTreeMap<(&'a str, Attempt), &'a AssetRecord>,
    scores: BTreeMap<Attempt, &'a ScoreRecord>,
}

impl<'a> RecordIndex<'a> {
    pub fn build(detail: &'a RunDetail) -> Self {
        let mut index = Self::default();
        for stage in &detail.stages {
            if !stage.stage_name.is_empty() {
                index
                    .stages
                    .insert((stage.stage_name.as_str(), stage.attempt), stage);
            }
        }
        for prompt in &detail.prompts {
            if !prompt.stage_name.is_empty() {
                index
                    .prompts
                    .insert((prompt.stage_name.as_str(), prompt.attempt), prompt);
            }
        }
        for asset in &detail.assets {
            if !asset.stage_name.is_empty() {
                index
                    .assets
                    .insert((asset.stage_name.as_str(), asset.attempt), asset);
            }
        }
        for score in &detail.scores {
            index.scores.insert(score.attempt, score);
        }
        index
    }

    pub fn stage(&self, stage_name: &str, attempt: Attempt) -> Option<&'a StageRecord> {
        self.stages.get(&(stage_name, attempt)).copied()
    }

    pub fn prompt(&self, stage_name: &str, attempt: Attempt) -> Option<&'a PromptRecord> {
        self.prompts.get(&(stage_name, attempt)).copied()
    }

    pub fn asset(&self, stage_name: &str, attempt: Attempt) -> Option<&'a AssetRecord> {
        self.assets.get(&(stage_name, attempt)).copied()
    }

    pub fn score(&self, attempt: Attempt) -> Option<&'a ScoreRecord> {
        self.scores.get(&attempt).copied()
    }
}

// ---------------------------------------------------------------------------
// Payload helpers
// ---------------------------------------------------------------------------

/// Return `value` if it is a JSON object, otherwise an empty object.
pub fn safe_object(value: Option<&serde_json::Value>) -> serde_json::Map<String, serde_json::Value> {
    match value {
        Some(serde_json::Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
