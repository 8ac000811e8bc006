//! Roadmap pipeline
//!
//! A fixed, linear sequence of stages:
//!
//! ```text
//! Draft -> Questions -> (operator answers) -> Refine
//! ```
//!
//! The non-interactive path skips straight from Draft to Refine. Every
//! network-bound stage runs with a progress indicator on screen, and the
//! indicator is stopped before the stage's result is used or anything else
//! is written to the terminal.

mod answers;
mod error;
mod orchestrator;
mod questions;
pub mod stages;
mod state;
pub mod status;

pub use answers::{AnswerSet, AnswerSource, InputError, ReadlineAnswers, collect_answers};
pub use error::PipelineError;
pub use orchestrator::{DRAFT_CAPTION, Pipeline, QUESTIONS_CAPTION, REFINE_CAPTION, REFLECT_CAPTION};
pub use questions::{Question, QuestionSet};
pub use stages::{GenerationSettings, StageContext};
pub use state::{Idea, PipelineState, Stage, StageResult};
pub use status::{ConsoleReporter, MessageTone, ReporterError, StatusReporter};
