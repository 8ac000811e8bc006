//! Full-screen front end
//!
//! An idea input box, a status pane fed by the pipeline's status reporter,
//! and a scrollable markdown view of the finished roadmap. Runs the
//! non-interactive pipeline path.

mod app;
mod events;
mod runner;
pub mod state;
mod views;

pub use app::App;
pub use events::{Event, EventHandler};
pub use runner::TuiRunner;
pub use state::AppState;

use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tracing::debug;

use crate::pipeline::Pipeline;
use crate::progress::AnimationKind;

/// Redraw rate while nothing else happens; fast enough for the animations
const TICK_RATE: Duration = Duration::from_millis(50);

/// Terminal type alias
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init() -> Result<Tui> {
    debug!("tui::init: called");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore the terminal to normal mode
pub fn restore() -> Result<()> {
    debug!("tui::restore: called");
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    Ok(())
}

/// Run the TUI until the user quits
///
/// `pipeline` must not write to stdout; build it with `Terminal::sink()`.
pub async fn run(pipeline: Pipeline, animation: AnimationKind) -> Result<()> {
    let terminal = init()?;

    // Restore the terminal even on early return or error
    struct TerminalGuard;
    impl Drop for TerminalGuard {
        fn drop(&mut self) {
            let _ = restore();
        }
    }
    let _guard = TerminalGuard;

    let mut runner = TuiRunner::new(terminal, EventHandler::new(TICK_RATE), pipeline, animation);
    runner.run().await
}
