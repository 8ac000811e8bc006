//! Status reporting - stage completion events for whatever UI is attached

use colored::Colorize;
use tracing::debug;

use crate::progress::Terminal;

/// Failure raised by a reporter
pub type ReporterError = Box<dyn std::error::Error + Send + Sync>;

pub const DRAFT_COMPLETE: &str = "✅ Initial roadmap generation complete!";
pub const QUESTIONS_COMPLETE: &str = "✅ Customized questions generated!";
pub const REFINE_COMPLETE: &str = "✅ Roadmap customization complete!";
/// Refine completion on the non-interactive path
pub const GENERATION_COMPLETE: &str = "✅ Roadmap generation complete!";

/// How a status message should be emphasised
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTone {
    Success,
    Starting,
    Info,
}

impl MessageTone {
    pub fn of(message: &str) -> Self {
        if message.contains('✅') {
            Self::Success
        } else if message.starts_with("Starting") {
            Self::Starting
        } else {
            Self::Info
        }
    }
}

/// Receives stage completion messages, one at a time and in stage order
///
/// Returning an error aborts the pipeline run.
pub trait StatusReporter {
    fn report(&mut self, message: &str) -> Result<(), ReporterError>;
}

impl<F> StatusReporter for F
where
    F: FnMut(&str) -> Result<(), ReporterError>,
{
    fn report(&mut self, message: &str) -> Result<(), ReporterError> {
        self(message)
    }
}

/// Prints colored status lines to the terminal
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    terminal: Terminal,
}

impl ConsoleReporter {
    pub fn new(terminal: Terminal) -> Self {
        Self { terminal }
    }

    fn styled(message: &str) -> String {
        match MessageTone::of(message) {
            MessageTone::Success => message.green().bold().to_string(),
            MessageTone::Starting => message.yellow().bold().to_string(),
            MessageTone::Info => message.yellow().to_string(),
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn report(&mut self, message: &str) -> Result<(), ReporterError> {
        debug!(%message, "ConsoleReporter::report: called");
        self.terminal.write_line(&Self::styled(message))?;
        Ok(())
    }
}
