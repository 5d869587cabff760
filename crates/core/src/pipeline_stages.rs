//! Pipeline stage vocabulary, diagram nodes, and the static flow graph.
//!
//! The executor persists records under a small set of stage keys
//! (`stage1_prompt`, `stage3_upgrade`, ...). The run diagram splits the
//! composite `stage3_upgrade` key into three presentation nodes, so the
//! two vocabularies are kept apart here: [`PipelineStage`] for stored
//! keys and [`DiagramNode`] for what the display layer draws.

use serde::Serialize;

// ---------------------------------------------------------------------------
// Executor stage keys
// ---------------------------------------------------------------------------

/// Initial prompt generation. Runs once per run (attempt 0).
pub const STAGE1_PROMPT: &str = "stage1_prompt";
/// Draft image generation. Runs once per run (attempt 0).
pub const STAGE2_DRAFT: &str = "stage2_draft";
/// Composite critique / prompt upgrade / regenerate stage, one per attempt.
pub const STAGE3_UPGRADE: &str = "stage3_upgrade";
/// Quality scoring, one per attempt.
pub const QUALITY_GATE: &str = "quality_gate";
/// White background normalization, one per passing attempt.
pub const STAGE4_BACKGROUND: &str = "stage4_background";
/// Terminal pseudo-stage the run pointer moves to once finished.
pub const COMPLETED: &str = "completed";

// ---------------------------------------------------------------------------
// Asset stage tags
// ---------------------------------------------------------------------------

/// Asset produced by the draft stage.
pub const ASSET_STAGE2_DRAFT: &str = "stage2_draft";
/// Asset produced by the stage 3 regeneration.
pub const ASSET_STAGE3_UPGRADED: &str = "stage3_upgraded";
/// Asset produced by background normalization.
pub const ASSET_STAGE4_WHITE_BG: &str = "stage4_white_bg";

/// Attempt number used for stages that run once per run.
pub const ATTEMPT_INDEPENDENT: i32 = 0;

/// A stage key as stored in `stage_results.stage_name` and
/// `runs.current_stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Stage1Prompt,
    Stage2Draft,
    Stage3Upgrade,
    QualityGate,
    Stage4Background,
    Completed,
}

impl PipelineStage {
    /// Parse a stored stage key. Unknown keys yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            STAGE1_PROMPT => Some(Self::Stage1Prompt),
            STAGE2_DRAFT => Some(Self::Stage2Draft),
            STAGE3_UPGRADE => Some(Self::Stage3Upgrade),
            QUALITY_GATE => Some(Self::QualityGate),
            STAGE4_BACKGROUND => Some(Self::Stage4Background),
            COMPLETED => Some(Self::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage1Prompt => STAGE1_PROMPT,
            Self::Stage2Draft => STAGE2_DRAFT,
            Self::Stage3Upgrade => STAGE3_UPGRADE,
            Self::QualityGate => QUALITY_GATE,
            Self::Stage4Background => STAGE4_BACKGROUND,
            Self::Completed => COMPLETED,
        }
    }

    /// Whether records for this stage are always written under attempt 0.
    pub fn is_attempt_independent(&self) -> bool {
        matches!(self, Self::Stage1Prompt | Self::Stage2Draft)
    }
}

// ---------------------------------------------------------------------------
// Diagram nodes
// ---------------------------------------------------------------------------

/// One of the eight nodes drawn by the run diagram, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramNode {
    Stage1Prompt,
    Stage2Draft,
    Stage3Critique,
    Stage3PromptUpgrade,
    Stage3Generate,
    QualityGate,
    Stage4Background,
    Completed,
}

impl DiagramNode {
    /// All nodes in pipeline order.
    pub const ALL: [DiagramNode; 8] = [
        Self::Stage1Prompt,
        Self::Stage2Draft,
        Self::Stage3Critique,
        Self::Stage3PromptUpgrade,
        Self::Stage3Generate,
        Self::QualityGate,
        Self::Stage4Background,
        Self::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stage1Prompt => "stage1_prompt",
            Self::Stage2Draft => "stage2_draft",
            Self::Stage3Critique => "stage3_critique",
            Self::Stage3PromptUpgrade => "stage3_prompt_upgrade",
            Self::Stage3Generate => "stage3_generate",
            Self::QualityGate => "quality_gate",
            Self::Stage4Background => "stage4_background",
            Self::Completed => "completed",
        }
    }

    /// The stored stage key whose execution record backs this node.
    ///
    /// The three stage 3 sub-nodes share the `stage3_upgrade` record.
    /// `completed` has no record of its own.
    pub fn record_stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage1Prompt => Some(PipelineStage::Stage1Prompt),
            Self::Stage2Draft => Some(PipelineStage::Stage2Draft),
            Self::Stage3Critique | Self::Stage3PromptUpgrade | Self::Stage3Generate => {
                Some(PipelineStage::Stage3Upgrade)
            }
            Self::QualityGate => Some(PipelineStage::QualityGate),
            Self::Stage4Background => Some(PipelineStage::Stage4Background),
            Self::Completed => None,
        }
    }

    /// The attempt number this node's record is keyed under when the
    /// diagram is evaluated at `attempt`.
    pub fn record_attempt(&self, attempt: i32) -> i32 {
        match self.record_stage() {
            Some(stage) if stage.is_attempt_independent() => ATTEMPT_INDEPENDENT,
            _ => attempt,
        }
    }

    /// Static description of what this node does.
    pub fn contract(&self) -> &'static StageContract {
        match self {
            Self::Stage1Prompt => &STAGE_CONTRACTS[0],
            Self::Stage2Draft => &STAGE_CONTRACTS[1],
            Self::Stage3Critique => &STAGE_CONTRACTS[2],
            Self::Stage3PromptUpgrade => &STAGE_CONTRACTS[3],
            Self::Stage3Generate => &STAGE_CONTRACTS[4],
            Self::QualityGate => &STAGE_CONTRACTS[5],
            Self::Stage4Background => &STAGE_CONTRACTS[6],
            Self::Completed => &STAGE_CONTRACTS[7],
        }
    }
}

// ---------------------------------------------------------------------------
// Stage contracts
// ---------------------------------------------------------------------------

/// Static description of a diagram node: who runs it, what it consumes,
/// what it is expected to produce, and how it is retried.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageContract {
    pub id: DiagramNode,
    pub label: &'static str,
    pub provider: &'static str,
    pub inputs: &'static [&'static str],
    pub expected: &'static [&'static str],
    pub retry_policy: &'static str,
}

const API_AND_STAGE_RETRY: &str = "API retry + stage retry";

/// Contracts for every node, in pipeline order.
pub const STAGE_CONTRACTS: [StageContract; 8] = [
    StageContract {
        id: DiagramNode::Stage1Prompt,
        label: "Stage 1 Prompt",
        provider: "OpenAI Assistant",
        inputs: &["word", "part_of_sentence", "category", "context", "boy_or_girl"],
        expected: &["first prompt", "need a person"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Stage2Draft,
        label: "Stage 2 Draft",
        provider: "Replicate: flux-schnell",
        inputs: &["prompt 1"],
        expected: &["prediction status", "output URL", "draft image"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Stage3Critique,
        label: "Stage 3.1 Critique",
        provider: "OpenAI Vision",
        inputs: &["previous image", "word/POS/category"],
        expected: &["challenges", "recommendations"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Stage3PromptUpgrade,
        label: "Stage 3.2 Prompt Upgrade",
        provider: "OpenAI Assistant",
        inputs: &["old prompt", "critique", "previous score feedback"],
        expected: &["upgraded prompt"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Stage3Generate,
        label: "Stage 3.3 Image Generate",
        provider: "Replicate: flux-pro / imagen fallback",
        inputs: &["upgraded prompt"],
        expected: &["upgraded image"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::QualityGate,
        label: "Quality Gate",
        provider: "OpenAI Vision",
        inputs: &["stage3 image", "word/POS/category", "threshold"],
        expected: &["score", "explanation", "failure_tags", "pass_fail"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Stage4Background,
        label: "Stage 4 White Background",
        provider: "Replicate: nano-banana",
        inputs: &["passing stage3 image"],
        expected: &["white background image"],
        retry_policy: API_AND_STAGE_RETRY,
    },
    StageContract {
        id: DiagramNode::Completed,
        label: "Completed",
        provider: "System",
        inputs: &["final run state"],
        expected: &["completed_pass | completed_fail_threshold | failed_technical"],
        retry_policy: "N/A",
    },
];

// ---------------------------------------------------------------------------
// Flow edges
// ---------------------------------------------------------------------------

/// How an edge participates in the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Normal progression to the next stage.
    Forward,
    /// Retry path from a failed quality gate back to the critique.
    Loop,
    /// Terminal path taken when the attempt budget is exhausted.
    Branch,
}

/// A static edge of the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlowEdge {
    pub from: DiagramNode,
    pub to: DiagramNode,
    pub kind: EdgeKind,
    pub label: &'static str,
}

/// The pipeline graph. Independent of any run's state.
pub const FLOW_EDGES: [FlowEdge; 9] = [
    FlowEdge {
        from: DiagramNode::Stage1Prompt,
        to: DiagramNode::Stage2Draft,
        kind: EdgeKind::Forward,
        label: "prompt 1",
    },
    FlowEdge {
        from: DiagramNode::Stage2Draft,
        to: DiagramNode::Stage3Critique,
        kind: EdgeKind::Forward,
        label: "start attempt A1",
    },
    FlowEdge {
        from: DiagramNode::Stage3Critique,
        to: DiagramNode::Stage3PromptUpgrade,
        kind: EdgeKind::Forward,
        label: "critique output",
    },
    FlowEdge {
        from: DiagramNode::Stage3PromptUpgrade,
        to: DiagramNode::Stage3Generate,
        kind: EdgeKind::Forward,
        label: "upgraded prompt",
    },
    FlowEdge {
        from: DiagramNode::Stage3Generate,
        to: DiagramNode::QualityGate,
        kind: EdgeKind::Forward,
        label: "score upgraded image",
    },
    FlowEdge {
        from: DiagramNode::QualityGate,
        to: DiagramNode::Stage3Critique,
        kind: EdgeKind::Loop,
        label: "fail + attempts remain",
    },
    FlowEdge {
        from: DiagramNode::QualityGate,
        to: DiagramNode::Stage4Background,
        kind: EdgeKind::Forward,
        label: "pass",
    },
    FlowEdge {
        from: DiagramNode::Stage4Background,
        to: DiagramNode::Completed,
        kind: EdgeKind::Forward,
        label: "final white-bg output",
    },
    FlowEdge {
        from: DiagramNode::QualityGate,
        to: DiagramNode::Completed,
        kind: EdgeKind::Branch,
        label: "fail + attempts exhausted",
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
