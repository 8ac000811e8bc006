//! Operator answers - the AnswerSet and where answers come from

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::debug;

use super::{Question, QuestionSet};
use crate::progress::Terminal;

/// Errors while reading operator input
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Interrupted by operator")]
    Interrupted,

    #[error("Failed to read answer: {0}")]
    Io(#[from] std::io::Error),

    #[error("Readline error: {0}")]
    Readline(String),
}

/// Answers keyed by question key, in the order they were recorded
///
/// Only keys of the QuestionSet the answers were recorded against are ever
/// present, and never with a blank value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    entries: Vec<(String, String)>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer; returns false when it was skipped
    ///
    /// Blank answers and keys the question set does not know are skipped.
    /// Answering the same key twice keeps the latest answer.
    pub fn record(&mut self, questions: &QuestionSet, key: &str, answer: &str) -> bool {
        let answer = answer.trim();
        if answer.is_empty() {
            debug!(%key, "AnswerSet::record: blank answer, skipping");
            return false;
        }
        if !questions.contains_key(key) {
            debug!(%key, "AnswerSet::record: unknown key, skipping");
            return false;
        }
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = answer.to_string(),
            None => self.entries.push((key.to_string(), answer.to_string())),
        }
        true
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Where answers to clarification questions come from
pub trait AnswerSource {
    /// Called once before the first question
    fn begin(&mut self, _questions: &QuestionSet) -> Result<(), InputError> {
        Ok(())
    }

    /// Ask one question; `None` skips it
    ///
    /// `index` is zero-based.
    fn ask(&mut self, index: usize, question: &Question) -> Result<Option<String>, InputError>;
}

/// Interactive answers read line by line from the terminal
pub struct ReadlineAnswers {
    editor: DefaultEditor,
    terminal: Terminal,
}

impl ReadlineAnswers {
    pub fn new(terminal: Terminal) -> Result<Self, InputError> {
        debug!("ReadlineAnswers::new: called");
        let editor = DefaultEditor::new().map_err(|e| InputError::Readline(e.to_string()))?;
        Ok(Self { editor, terminal })
    }
}

impl AnswerSource for ReadlineAnswers {
    fn begin(&mut self, questions: &QuestionSet) -> Result<(), InputError> {
        debug!(count = questions.len(), "ReadlineAnswers::begin: called");
        self.terminal.write_line("")?;
        self.terminal.write_line(
            &"Based on the roadmap analysis, please answer these questions to help customize it further:"
                .bold()
                .to_string(),
        )?;
        self.terminal.write_line(
            &"(Press Enter to skip any question you don't know or don't care about)"
                .dimmed()
                .to_string(),
        )?;
        self.terminal.write_line("")?;
        Ok(())
    }

    fn ask(&mut self, index: usize, question: &Question) -> Result<Option<String>, InputError> {
        debug!(index, key = %question.key, "ReadlineAnswers::ask: called");
        let prompt = format!("{}. {}\n   > ", index + 1, question.text);
        match self.editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    debug!("ReadlineAnswers::ask: skipped");
                    Ok(None)
                } else {
                    let _ = self.editor.add_history_entry(line);
                    Ok(Some(line.to_string()))
                }
            }
            Err(ReadlineError::Eof) => {
                debug!("ReadlineAnswers::ask: end of input, skipping");
                Ok(None)
            }
            Err(ReadlineError::Interrupted) => {
                debug!("ReadlineAnswers::ask: interrupted");
                Err(InputError::Interrupted)
            }
            Err(ReadlineError::Io(e)) => Err(InputError::Io(e)),
            Err(e) => Err(InputError::Readline(e.to_string())),
        }
    }
}

/// Collect answers for every question in order
pub fn collect_answers(questions: &QuestionSet, source: &mut dyn AnswerSource) -> Result<AnswerSet, InputError> {
    debug!(count = questions.len(), "collect_answers: called");
    source.begin(questions)?;

    let mut answers = AnswerSet::new();
    for (index, question) in questions.iter().enumerate() {
        if let Some(answer) = source.ask(index, question)? {
            answers.record(questions, &question.key, &answer);
        }
    }

    debug!(answered = answers.len(), "collect_answers: done");
    Ok(answers)
}
