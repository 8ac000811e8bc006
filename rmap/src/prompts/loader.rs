//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use handlebars::Handlebars;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use super::embedded;

/// Errors from loading or rendering a template
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template not found: {0}")]
    NotFound(String),

    #[error("Failed to read prompt {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render template {name}: {source}")]
    Render {
        name: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Context for the `draft` template
#[derive(Debug, Clone, Serialize)]
pub struct DraftContext<'a> {
    pub idea: &'a str,
}

/// Context for the `questions` template
#[derive(Debug, Clone, Serialize)]
pub struct QuestionsContext<'a> {
    pub idea: &'a str,
    pub draft: &'a str,
}

/// One answered question as rendered into the refine prompt
#[derive(Debug, Clone, Serialize)]
pub struct AnswerLine<'a> {
    pub key: &'a str,
    pub answer: &'a str,
}

/// Context for the `refine` template
#[derive(Debug, Clone, Serialize)]
pub struct RefineContext<'a> {
    pub idea: &'a str,
    pub draft: &'a str,
    pub answers: Vec<AnswerLine<'a>>,
    pub has_answers: bool,
}

impl<'a> RefineContext<'a> {
    pub fn new(idea: &'a str, draft: &'a str, answers: Vec<AnswerLine<'a>>) -> Self {
        debug!(answer_count = answers.len(), "RefineContext::new: called");
        let has_answers = !answers.is_empty();
        Self {
            idea,
            draft,
            answers,
            has_answers,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.roadmapper/prompts/`)
    user_dir: Option<PathBuf>,
    /// Project default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a new prompt loader rooted at `root`
    ///
    /// Looks for `.roadmapper/prompts/` and `prompts/` under the root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".roadmapper/prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.is_dir();
        let repo_dir_exists = repo_dir.is_dir();
        debug!(
            ?user_dir,
            %user_dir_exists,
            ?repo_dir,
            %repo_dir_exists,
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
            repo_dir: repo_dir_exists.then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    /// Prompts are plain text, not HTML
    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.roadmapper/prompts/{name}.pmt`
    /// 2. Project default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String, PromptError> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found on disk");
                return std::fs::read_to_string(&path).map_err(|source| PromptError::Read { path, source });
            }
            debug!(?path, "PromptLoader::load_template: not found");
        }

        debug!("PromptLoader::load_template: trying embedded fallback");
        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String, PromptError> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|source| PromptError::Render {
                name: template_name.to_string(),
                source: Box::new(source),
            })
    }
}
