//! Event type definitions for progress reporting.

use crate::core::scorer::ScoreTier;
use serde::{Deserialize, Serialize};

/// All events emitted by the game service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Workflow-level events
    Workflow(WorkflowEvent),
    /// Image generation events
    Generate(GenerateEvent),
    /// Comparison events
    Compare(CompareEvent),
}

/// Workflow-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorkflowEvent {
    /// Moving to a new stage
    StageChanged { stage: Stage },
    /// The stage did not finish within the budget
    TimedOut { stage: Stage, budget_ms: u64 },
    /// The stage failed
    Failed { stage: Stage, message: String },
}

/// Events while generating an image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GenerateEvent {
    /// A target prompt was drawn for a new round
    PromptChosen { prompt: String },
    /// The provider returned an image
    Completed { url: String, duration_ms: u64 },
}

/// Events while comparing two images
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// An image was retrieved
    ImageFetched { label: String, bytes: usize },
    /// Both images were scored
    Scored {
        score: u8,
        tier: ScoreTier,
        duration_ms: u64,
    },
}

/// Stages of a game workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Generating,
    Fetching,
    Scoring,
}

impl Stage {
    /// Phrase used in timeout messages ("timed out while ...")
    pub fn activity(&self) -> &'static str {
        match self {
            Stage::Generating => "generating image",
            Stage::Fetching => "fetching images",
            Stage::Scoring => "scoring images",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Generating => write!(f, "Generating"),
            Stage::Fetching => write!(f, "Fetching"),
            Stage::Scoring => write!(f, "Scoring"),
        }
    }
}
