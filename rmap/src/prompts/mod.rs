//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for the pipeline stages.
//!
//! Template loading chain:
//! 1. `.roadmapper/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (project default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{AnswerLine, DraftContext, PromptError, PromptLoader, QuestionsContext, RefineContext};
