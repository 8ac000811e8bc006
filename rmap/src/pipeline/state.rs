//! Stage identifiers, pipeline state, and stage outputs

use std::fmt;

use tracing::debug;

use super::PipelineError;

/// A network-bound step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Draft,
    Questions,
    Refine,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Questions => "questions",
            Self::Refine => "refine",
        }
    }

    /// Prompt template rendered for this stage
    pub fn template_name(&self) -> &'static str {
        self.name()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a run currently is
///
/// Runs only ever move forward through this list; `Failed` can be entered
/// from any non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PipelineState {
    #[default]
    Idle,
    Drafting,
    SynthesizingQuestions,
    AwaitingAnswers,
    Refining,
    Complete,
    Failed,
}

impl PipelineState {
    fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Drafting => 1,
            Self::SynthesizingQuestions => 2,
            Self::AwaitingAnswers => 3,
            Self::Refining => 4,
            Self::Complete => 5,
            Self::Failed => 6,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Check whether moving to `next` keeps the run linear
    ///
    /// Forward moves may skip states (the non-interactive path goes straight
    /// from Drafting to Refining); backward moves and leaving a terminal
    /// state are rejected.
    pub fn can_advance_to(&self, next: PipelineState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Failed => true,
            Self::Idle => false,
            _ => next.rank() > self.rank(),
        }
    }

    /// Move to `next`, or report the illegal transition
    pub fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        debug!(from = ?self, to = ?next, "PipelineState::advance: called");
        if !self.can_advance_to(next) {
            debug!("PipelineState::advance: rejected");
            return Err(PipelineError::InvalidTransition { from: *self, to: next });
        }
        *self = next;
        Ok(())
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Drafting => "drafting",
            Self::SynthesizingQuestions => "synthesizing-questions",
            Self::AwaitingAnswers => "awaiting-answers",
            Self::Refining => "refining",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// The product idea a run starts from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea(String);

impl Idea {
    /// Wrap a non-blank description
    pub fn new(description: impl Into<String>) -> Result<Self, PipelineError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(PipelineError::EmptyIdea);
        }
        Ok(Self(description.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Idea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Text produced by one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageResult {
    pub stage: Stage,
    pub text: String,
}

impl StageResult {
    pub fn new(stage: Stage, text: impl Into<String>) -> Self {
        Self {
            stage,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_path_is_linear() {
        let mut state = PipelineState::Idle;
        for next in [
            PipelineState::Drafting,
            PipelineState::SynthesizingQuestions,
            PipelineState::AwaitingAnswers,
            PipelineState::Refining,
            PipelineState::Complete,
        ] {
            state.advance(next).unwrap();
        }
        assert_eq!(state, PipelineState::Complete);
    }

    #[test]
    fn test_non_interactive_path_skips_forward() {
        let mut state = PipelineState::Drafting;
        assert!(state.advance(PipelineState::Refining).is_ok());
    }

    #[test]
    fn test_backward_moves_rejected() {
        let mut state = PipelineState::Refining;
        assert!(matches!(
            state.advance(PipelineState::Drafting),
            Err(PipelineError::InvalidTransition { .. })
        ));
        assert!(state.advance(PipelineState::Refining).is_err());
        assert_eq!(state, PipelineState::Refining);
    }

    #[test]
    fn test_failed_reachable_from_any_live_state() {
        for from in [
            PipelineState::Idle,
            PipelineState::Drafting,
            PipelineState::SynthesizingQuestions,
            PipelineState::AwaitingAnswers,
            PipelineState::Refining,
        ] {
            assert!(from.can_advance_to(PipelineState::Failed), "{from} -> failed");
        }
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(!PipelineState::Complete.can_advance_to(PipelineState::Failed));
        assert!(!PipelineState::Failed.can_advance_to(PipelineState::Complete));
        assert!(!PipelineState::Failed.can_advance_to(PipelineState::Idle));
    }

    #[test]
    fn test_idea_rejects_blank() {
        assert!(matches!(Idea::new("   \n"), Err(PipelineError::EmptyIdea)));
        assert_eq!(Idea::new("  water app ").unwrap().as_str(), "water app");
    }
}
