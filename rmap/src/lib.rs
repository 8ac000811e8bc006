//! Roadmapper - staged roadmap generation
//!
//! Turns a short product idea into a detailed development roadmap by
//! chaining several calls to a generative text service, optionally pausing
//! to ask the operator clarification questions before the final pass.
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait, Anthropic implementation, response assembly
//! - [`prompts`] - Handlebars prompt templates with on-disk overrides
//! - [`progress`] - Terminal animations shown while a stage is blocked
//! - [`pipeline`] - Stages, state machine, answers, status reporting
//! - [`config`] - Configuration types and loading
//! - [`output`] - Saving finished roadmaps
//! - [`cli`] - Command-line interface
//! - [`tui`] - Full-screen front end

pub mod cli;
pub mod config;
pub mod llm;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod tui;

// Re-export commonly used types
pub use config::{Config, LlmConfig};
pub use llm::{AnthropicClient, GenerationRequest, LlmClient, LlmError, create_client, generate};
pub use pipeline::{
    AnswerSet, AnswerSource, ConsoleReporter, GenerationSettings, Idea, Pipeline, PipelineError, PipelineState,
    QuestionSet, ReadlineAnswers, Stage, StageResult, StatusReporter,
};
pub use progress::{AnimationKind, ProgressIndicator, Terminal};
pub use prompts::PromptLoader;
