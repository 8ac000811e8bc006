//! Pipeline errors

use thiserror::Error;

use super::{InputError, PipelineState, ReporterError, Stage};
use crate::llm::LlmError;
use crate::prompts::PromptError;

/// Everything that can end a pipeline run early
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Idea must not be empty")]
    EmptyIdea,

    #[error("Generation failed during {stage} stage: {source}")]
    Generation {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    #[error("Failed to build {stage} prompt: {source}")]
    Prompt {
        stage: Stage,
        #[source]
        source: PromptError,
    },

    #[error("Status reporter failed after {stage} stage: {source}")]
    Reporter {
        stage: Stage,
        #[source]
        source: ReporterError,
    },

    #[error("Answer collection failed: {0}")]
    Input(#[from] InputError),

    #[error("Invalid pipeline transition: {from} -> {to}")]
    InvalidTransition { from: PipelineState, to: PipelineState },
}

impl PipelineError {
    /// The stage the failure is attributed to, when there is one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Generation { stage, .. } | Self::Prompt { stage, .. } | Self::Reporter { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Whether this came from the generative text service
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }
}
