//! Stage functions
//!
//! Each stage renders its prompt from the context accumulated so far, makes
//! one call through the shared client, and returns the new fragment. None of
//! them touch the terminal; the orchestrator owns presentation.

use tracing::{debug, info};

use super::{AnswerSet, Idea, PipelineError, QuestionSet, Stage, StageResult};
use crate::config::LlmConfig;
use crate::llm::{self, GenerationRequest, LlmClient};
use crate::prompts::{AnswerLine, DraftContext, PromptLoader, QuestionsContext, RefineContext};

/// Per-request knobs taken from the LLM config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Extended reasoning budget for draft and refine; 0 disables
    pub thinking_budget: u32,
    pub stream: bool,
}

impl GenerationSettings {
    fn request(&self, prompt: String, thinking: bool) -> GenerationRequest {
        let request = GenerationRequest::new(prompt, self.model.clone(), self.max_tokens, self.stream);
        if thinking {
            request.with_thinking(self.thinking_budget)
        } else {
            request
        }
    }
}

impl From<&LlmConfig> for GenerationSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            thinking_budget: config.thinking_budget,
            stream: config.stream,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

/// What every network-bound stage needs
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub llm: &'a dyn LlmClient,
    pub prompts: &'a PromptLoader,
    pub settings: &'a GenerationSettings,
}

impl StageContext<'_> {
    async fn call(&self, stage: Stage, prompt: String, thinking: bool) -> Result<String, PipelineError> {
        debug!(%stage, prompt_len = prompt.len(), %thinking, "StageContext::call: called");
        let request = self.settings.request(prompt, thinking);
        llm::generate(self.llm, &request)
            .await
            .map_err(|source| PipelineError::Generation { stage, source })
    }

    fn render<T: serde::Serialize>(&self, stage: Stage, context: &T) -> Result<String, PipelineError> {
        self.prompts
            .render(stage.template_name(), context)
            .map_err(|source| PipelineError::Prompt { stage, source })
    }
}

/// Generate the initial roadmap from the idea
pub async fn draft(ctx: &StageContext<'_>, idea: &Idea) -> Result<StageResult, PipelineError> {
    debug!("draft: called");
    let prompt = ctx.render(Stage::Draft, &DraftContext { idea: idea.as_str() })?;
    let text = ctx.call(Stage::Draft, prompt, true).await?;
    info!(len = text.len(), "Draft roadmap generated");
    Ok(StageResult::new(Stage::Draft, text))
}

/// Ask for clarification questions about the draft
///
/// Unusable output is replaced by the default questions; only a failed call
/// is an error.
pub async fn synthesize_questions(
    ctx: &StageContext<'_>,
    idea: &Idea,
    draft: &StageResult,
) -> Result<QuestionSet, PipelineError> {
    debug!("synthesize_questions: called");
    let prompt = ctx.render(
        Stage::Questions,
        &QuestionsContext {
            idea: idea.as_str(),
            draft: &draft.text,
        },
    )?;
    let text = ctx.call(Stage::Questions, prompt, false).await?;
    let questions = QuestionSet::parse(&text);
    info!(
        count = questions.len(),
        fallback = questions.is_fallback(),
        "Clarification questions ready"
    );
    Ok(questions)
}

/// Revise the draft, folding in whatever answers were given
pub async fn refine(
    ctx: &StageContext<'_>,
    idea: &Idea,
    draft: &StageResult,
    answers: &AnswerSet,
) -> Result<StageResult, PipelineError> {
    debug!(answer_count = answers.len(), "refine: called");
    let lines = answers.iter().map(|(key, answer)| AnswerLine { key, answer }).collect();
    let prompt = ctx.render(Stage::Refine, &RefineContext::new(idea.as_str(), &draft.text, lines))?;
    let text = ctx.call(Stage::Refine, prompt, true).await?;
    info!(len = text.len(), "Refined roadmap generated");
    Ok(StageResult::new(Stage::Refine, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};

    fn settings() -> GenerationSettings {
        GenerationSettings {
            model: "test-model".to_string(),
            max_tokens: 8000,
            thinking_budget: 2000,
            stream: false,
        }
    }

    #[tokio::test]
    async fn test_draft_uses_thinking_budget() {
        let client = MockLlmClient::new(vec![MockReply::text("# Roadmap")]);
        let prompts = PromptLoader::embedded_only();
        let settings = settings();
        let ctx = StageContext {
            llm: &client,
            prompts: &prompts,
            settings: &settings,
        };

        let idea = Idea::new("A todo app").unwrap();
        let result = draft(&ctx, &idea).await.unwrap();

        assert_eq!(result, StageResult::new(Stage::Draft, "# Roadmap"));
        let requests = client.requests();
        assert_eq!(requests[0].model, "test-model");
        assert_eq!(requests[0].effective_thinking_budget(), Some(2000));
        assert!(requests[0].prompt.contains("A todo app"));
    }

    #[tokio::test]
    async fn test_questions_never_use_thinking() {
        let client = MockLlmClient::new(vec![MockReply::text("{\"q\": \"Q?\"}")]);
        let prompts = PromptLoader::embedded_only();
        let settings = settings();
        let ctx = StageContext {
            llm: &client,
            prompts: &prompts,
            settings: &settings,
        };

        let idea = Idea::new("idea").unwrap();
        let draft = StageResult::new(Stage::Draft, "DRAFT TEXT");
        let questions = synthesize_questions(&ctx, &idea, &draft).await.unwrap();

        assert_eq!(questions.len(), 1);
        let requests = client.requests();
        assert_eq!(requests[0].thinking_budget, None);
        assert!(requests[0].prompt.contains("DRAFT TEXT"));
    }

    #[tokio::test]
    async fn test_questions_fallback_is_not_an_error() {
        let client = MockLlmClient::new(vec![MockReply::text("I'd rather chat about the weather.")]);
        let prompts = PromptLoader::embedded_only();
        let settings = settings();
        let ctx = StageContext {
            llm: &client,
            prompts: &prompts,
            settings: &settings,
        };

        let idea = Idea::new("idea").unwrap();
        let draft = StageResult::new(Stage::Draft, "d");
        let questions = synthesize_questions(&ctx, &idea, &draft).await.unwrap();
        assert!(questions.is_fallback());
    }

    #[tokio::test]
    async fn test_failed_call_is_tagged_with_stage() {
        let client = MockLlmClient::new(vec![MockReply::Fail("boom".to_string())]);
        let prompts = PromptLoader::embedded_only();
        let settings = settings();
        let ctx = StageContext {
            llm: &client,
            prompts: &prompts,
            settings: &settings,
        };

        let idea = Idea::new("idea").unwrap();
        let draft = StageResult::new(Stage::Draft, "d");
        let err = refine(&ctx, &idea, &draft, &AnswerSet::new()).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Refine));
    }

    #[test]
    fn test_settings_from_config() {
        let config = LlmConfig {
            thinking_budget: 0,
            ..LlmConfig::default()
        };
        let request = GenerationSettings::from(&config).request("p".to_string(), true);
        assert_eq!(request.effective_thinking_budget(), None);
    }
}
