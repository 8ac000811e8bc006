//! Pipeline orchestrator - sequences the stages, pairs each blocking call
//! with a progress indicator, and reports completions

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::stages::{self, GenerationSettings, StageContext};
use super::status::{DRAFT_COMPLETE, GENERATION_COMPLETE, QUESTIONS_COMPLETE, REFINE_COMPLETE};
use super::{AnswerSource, Idea, PipelineError, PipelineState, Stage, StageResult, StatusReporter, collect_answers};
use crate::llm::LlmClient;
use crate::progress::{AnimationKind, ProgressIndicator, Terminal};
use crate::prompts::PromptLoader;

pub const DRAFT_CAPTION: &str = "Generating roadmap based on your idea";
pub const QUESTIONS_CAPTION: &str = "Analyzing roadmap and generating customized questions";
pub const REFLECT_CAPTION: &str = "Starting reflection process with your input";
pub const REFINE_CAPTION: &str = "Refining roadmap";

/// Drives one idea from Idle to Complete (or Failed)
///
/// Holds the single client shared by every stage. A pipeline can be run
/// repeatedly; each run starts again from Idle.
pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    settings: GenerationSettings,
    terminal: Terminal,
    animation: AnimationKind,
    state: PipelineState,
}

impl Pipeline {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader, settings: GenerationSettings) -> Self {
        debug!(model = %settings.model, "Pipeline::new: called");
        Self {
            llm,
            prompts,
            settings,
            terminal: Terminal::stdout(),
            animation: AnimationKind::default(),
            state: PipelineState::Idle,
        }
    }

    /// Output stream shared by the animations
    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }

    /// Animation used by `run`
    pub fn with_animation(mut self, kind: AnimationKind) -> Self {
        self.animation = kind;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Non-interactive path: Draft, then Refine without answers
    pub async fn run(&mut self, idea: &Idea, reporter: &mut dyn StatusReporter) -> Result<StageResult, PipelineError> {
        debug!("Pipeline::run: called");
        self.state = PipelineState::Idle;
        let result = self.run_stages(idea, reporter).await;
        self.finish(result)
    }

    /// Full path: Draft, Questions, operator answers, then Refine
    pub async fn run_interactive(
        &mut self,
        idea: &Idea,
        animation: AnimationKind,
        answers: &mut dyn AnswerSource,
        reporter: &mut dyn StatusReporter,
    ) -> Result<StageResult, PipelineError> {
        debug!(?animation, "Pipeline::run_interactive: called");
        self.state = PipelineState::Idle;
        let result = self.run_interactive_stages(idea, animation, answers, reporter).await;
        self.finish(result)
    }

    async fn run_stages(&mut self, idea: &Idea, reporter: &mut dyn StatusReporter) -> Result<StageResult, PipelineError> {
        let kind = self.animation;

        self.advance(PipelineState::Drafting)?;
        let draft = with_indicator(&self.terminal, kind, DRAFT_CAPTION, stages::draft(&self.context(), idea)).await?;
        report(reporter, Stage::Draft, DRAFT_COMPLETE)?;

        self.advance(PipelineState::Refining)?;
        let no_answers = super::AnswerSet::new();
        let refined = with_indicator(
            &self.terminal,
            kind,
            REFINE_CAPTION,
            stages::refine(&self.context(), idea, &draft, &no_answers),
        )
        .await?;
        report(reporter, Stage::Refine, GENERATION_COMPLETE)?;

        self.advance(PipelineState::Complete)?;
        Ok(refined)
    }

    async fn run_interactive_stages(
        &mut self,
        idea: &Idea,
        kind: AnimationKind,
        answers: &mut dyn AnswerSource,
        reporter: &mut dyn StatusReporter,
    ) -> Result<StageResult, PipelineError> {
        self.advance(PipelineState::Drafting)?;
        let draft = with_indicator(&self.terminal, kind, DRAFT_CAPTION, stages::draft(&self.context(), idea)).await?;
        report(reporter, Stage::Draft, DRAFT_COMPLETE)?;

        self.advance(PipelineState::SynthesizingQuestions)?;
        let questions = with_indicator(
            &self.terminal,
            kind,
            QUESTIONS_CAPTION,
            stages::synthesize_questions(&self.context(), idea, &draft),
        )
        .await?;
        report(reporter, Stage::Questions, QUESTIONS_COMPLETE)?;

        // Operator input shares the terminal, so no animation here
        self.advance(PipelineState::AwaitingAnswers)?;
        let answers = collect_answers(&questions, answers)?;
        info!(
            answered = answers.len(),
            skipped = questions.len() - answers.len(),
            "Answers collected"
        );

        self.advance(PipelineState::Refining)?;
        let refined = with_indicator(
            &self.terminal,
            kind,
            REFLECT_CAPTION,
            stages::refine(&self.context(), idea, &draft, &answers),
        )
        .await?;
        report(reporter, Stage::Refine, REFINE_COMPLETE)?;

        self.advance(PipelineState::Complete)?;
        Ok(refined)
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            llm: self.llm.as_ref(),
            prompts: &self.prompts,
            settings: &self.settings,
        }
    }

    fn advance(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        self.state.advance(next)?;
        debug!(state = %self.state, "Pipeline::advance: entered state");
        Ok(())
    }

    fn finish(&mut self, result: Result<StageResult, PipelineError>) -> Result<StageResult, PipelineError> {
        match result {
            Ok(refined) => {
                info!(len = refined.text.len(), "Pipeline complete");
                Ok(refined)
            }
            Err(e) => {
                warn!(error = %e, state = %self.state, "Pipeline failed");
                self.state = PipelineState::Failed;
                Err(e)
            }
        }
    }
}

/// Run `work` with an animation on screen; the animation is fully stopped
/// and its line erased before the result is handed back
async fn with_indicator<T>(
    terminal: &Terminal,
    kind: AnimationKind,
    caption: &str,
    work: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    let mut indicator = ProgressIndicator::new(kind, caption, terminal.clone());
    indicator.start();
    let result = work.await;
    indicator.stop().await;
    result
}

fn report(reporter: &mut dyn StatusReporter, stage: Stage, message: &str) -> Result<(), PipelineError> {
    debug!(%stage, %message, "report: called");
    reporter
        .report(message)
        .map_err(|source| PipelineError::Reporter { stage, source })
}
