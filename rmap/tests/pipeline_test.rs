//! Integration tests for the roadmap pipeline
//!
//! These drive the public API end to end with a scripted service in place of
//! the network client.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use proptest::prelude::*;
use tokio::sync::mpsc;

use roadmapper::llm::{Completion, GenerationRequest, LlmClient, LlmError, StopReason, StreamChunk, StreamSummary};
use roadmapper::pipeline::{
    AnswerSource, GenerationSettings, Idea, InputError, Pipeline, PipelineError, PipelineState, Question,
    QuestionSet, ReporterError, Stage, collect_answers,
};
use roadmapper::pipeline::status::GENERATION_COMPLETE;
use roadmapper::progress::{AnimationKind, Terminal};
use roadmapper::prompts::PromptLoader;

// =============================================================================
// Helpers
// =============================================================================

/// Replies in order; `Err` entries fail the call
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<&str, &str>>) -> Arc<Self> {
        let replies = replies
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        Arc::new(Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, request: &GenerationRequest) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(LlmError::ApiError { status: 503, message }),
            None => Err(LlmError::InvalidResponse("script exhausted".to_string())),
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn complete(&self, request: &GenerationRequest) -> Result<Completion, LlmError> {
        let text = self.next(request)?;
        Ok(Completion {
            text,
            stop_reason: StopReason::EndTurn,
            usage: Default::default(),
        })
    }

    async fn stream(
        &self,
        request: &GenerationRequest,
        chunk_tx: mpsc::Sender<StreamChunk>,
    ) -> Result<StreamSummary, LlmError> {
        let text = self.next(request)?;
        for word in text.split_inclusive(' ') {
            let _ = chunk_tx.send(StreamChunk::TextDelta(word.to_string())).await;
        }
        Ok(StreamSummary::default())
    }
}

struct Operator(Vec<&'static str>);

impl AnswerSource for Operator {
    fn ask(&mut self, index: usize, _question: &Question) -> Result<Option<String>, InputError> {
        Ok(self.0.get(index).map(|s| s.to_string()))
    }
}

fn pipeline(client: Arc<ScriptedClient>, stream: bool) -> Pipeline {
    let settings = GenerationSettings {
        stream,
        ..GenerationSettings::default()
    };
    Pipeline::new(client, PromptLoader::embedded_only(), settings).with_terminal(Terminal::sink())
}

const WATER_DRAFT: &str = "# Water Intake Tracker Roadmap\n\n## Phase 1: Logging\nTrack glasses of water per day.";

const WATER_QUESTIONS: &str = r#"Here are some questions:
```json
{
  "platform": "Which mobile platforms should the app support first?",
  "reminders": "Should the app send hydration reminders?",
  "wearables": "Do you want to integrate with wearables?",
  "monetization": "How do you plan to monetize the app?",
  "launch_date": "When do you want to launch?"
}
```"#;

// =============================================================================
// Pipeline Scenarios
// =============================================================================

#[tokio::test]
async fn test_water_intake_interactive_scenario() {
    let client = ScriptedClient::new(vec![Ok(WATER_DRAFT), Ok(WATER_QUESTIONS), Ok("# Final roadmap")]);
    let mut pipeline = pipeline(client.clone(), true);
    // Answer 3 of 5; "wearables" blank, "launch_date" whitespace only
    let mut operator = Operator(vec!["iOS first", "Yes, every two hours", "", "Freemium", "   "]);
    let mut events: Vec<String> = Vec::new();
    let mut reporter = |m: &str| -> Result<(), ReporterError> {
        events.push(m.to_string());
        Ok(())
    };

    let idea = Idea::new("A mobile app for tracking water intake").unwrap();
    let result = pipeline
        .run_interactive(&idea, AnimationKind::Spinner, &mut operator, &mut reporter)
        .await
        .expect("pipeline should complete");

    assert_eq!(result.stage, Stage::Refine);
    assert_eq!(result.text, "# Final roadmap");
    assert_eq!(events.len(), 3);
    assert_eq!(pipeline.state(), PipelineState::Complete);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 3);
    let refine = &prompts[2];
    assert!(refine.contains("A mobile app for tracking water intake"));
    assert!(refine.contains(WATER_DRAFT));
    assert!(refine.contains("- platform: iOS first"));
    assert!(refine.contains("- reminders: Yes, every two hours"));
    assert!(refine.contains("- monetization: Freemium"));
    assert!(!refine.contains("wearables"));
    assert!(!refine.contains("launch_date"));
}

#[tokio::test]
async fn test_answer_set_from_scenario_has_three_entries() {
    let questions = QuestionSet::parse(WATER_QUESTIONS);
    assert_eq!(questions.len(), 5);

    let mut operator = Operator(vec!["iOS first", "Yes", "", "Freemium"]);
    let answers = collect_answers(&questions, &mut operator).unwrap();

    assert_eq!(answers.len(), 3);
    assert_eq!(answers.keys().collect::<Vec<_>>(), vec!["platform", "reminders", "monetization"]);
}

#[tokio::test]
async fn test_run_fails_on_second_call_with_refine_stage() {
    let client = ScriptedClient::new(vec![Ok(WATER_DRAFT), Err("service unavailable")]);
    let mut pipeline = pipeline(client, false);
    let mut events: Vec<String> = Vec::new();
    let mut reporter = |m: &str| -> Result<(), ReporterError> {
        events.push(m.to_string());
        Ok(())
    };

    let idea = Idea::new("A mobile app for tracking water intake").unwrap();
    let err = pipeline.run(&idea, &mut reporter).await.unwrap_err();

    match err {
        PipelineError::Generation { stage, source } => {
            assert_eq!(stage, Stage::Refine);
            assert!(matches!(source, LlmError::ApiError { status: 503, .. }));
        }
        other => panic!("Expected generation error, got {:?}", other),
    }
    assert_eq!(events.len(), 1);
    assert!(!events.iter().any(|e| e == GENERATION_COMPLETE));
    assert_eq!(pipeline.state(), PipelineState::Failed);
}

#[tokio::test]
async fn test_questions_failure_never_reaches_refine() {
    let client = ScriptedClient::new(vec![Ok(WATER_DRAFT), Err("overloaded"), Ok("unused")]);
    let mut pipeline = pipeline(client.clone(), true);
    let mut operator = Operator(vec![]);
    let mut reporter = |_: &str| -> Result<(), ReporterError> { Ok(()) };

    let idea = Idea::new("idea").unwrap();
    let err = pipeline
        .run_interactive(&idea, AnimationKind::Dots, &mut operator, &mut reporter)
        .await
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Questions));
    assert_eq!(client.prompts().len(), 2);
}

#[tokio::test]
async fn test_blank_response_is_an_error_not_a_result() {
    let client = ScriptedClient::new(vec![Ok("  \n  ")]);
    let mut pipeline = pipeline(client, true);
    let mut reporter = |_: &str| -> Result<(), ReporterError> { Ok(()) };

    let idea = Idea::new("idea").unwrap();
    let err = pipeline.run(&idea, &mut reporter).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Generation {
            stage: Stage::Draft,
            source: LlmError::EmptyResponse
        }
    ));
}

#[tokio::test]
async fn test_streamed_and_single_shot_agree() {
    let text = "# Roadmap with several words in it";
    for stream in [true, false] {
        let client = ScriptedClient::new(vec![Ok("draft"), Ok(text)]);
        let mut pipeline = pipeline(client, stream);
        let mut reporter = |_: &str| -> Result<(), ReporterError> { Ok(()) };
        let idea = Idea::new("idea").unwrap();
        let result = pipeline.run(&idea, &mut reporter).await.unwrap();
        assert_eq!(result.text, text, "stream = {stream}");
    }
}

// =============================================================================
// Properties
// =============================================================================

fn question_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::vec(("[a-z_]{1,8}", "[A-Za-z ?]{1,20}"), 1..10)
}

proptest! {
    #[test]
    fn prop_answers_subset_of_questions_and_never_blank(
        pairs in question_pairs(),
        replies in prop::collection::vec(prop::option::of("[ a-z]{0,6}"), 0..12),
        stray_key in "[a-z]{1,8}",
    ) {
        let questions = QuestionSet::from_pairs(pairs);

        struct Replies(Vec<Option<String>>);
        impl AnswerSource for Replies {
            fn ask(&mut self, index: usize, _q: &Question) -> Result<Option<String>, InputError> {
                Ok(self.0.get(index).cloned().flatten())
            }
        }

        let mut answers = collect_answers(&questions, &mut Replies(replies)).unwrap();
        answers.record(&questions, &stray_key, "stray");

        for (key, value) in answers.iter() {
            prop_assert!(questions.contains_key(key));
            prop_assert!(!value.trim().is_empty());
        }
        prop_assert!(answers.len() <= questions.len());
    }

    #[test]
    fn prop_question_parse_never_empty(text in ".{0,200}") {
        let questions = QuestionSet::parse(&text);
        prop_assert!(!questions.is_empty());
        let keys: Vec<&str> = questions.keys().collect();
        let mut deduped = keys.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(keys.len(), deduped.len());
    }
}
