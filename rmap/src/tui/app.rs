//! TUI application - keyboard handling
//!
//! The App owns the AppState and turns key events into state changes. It
//! never renders and never talks to the pipeline; the runner picks up
//! `pending_submit` and `cancel_requested`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, trace};

use super::state::{AppState, EMPTY_IDEA};
use crate::progress::AnimationKind;

/// Lines moved by PageUp / PageDown
const PAGE: u16 = 10;

#[derive(Debug)]
pub struct App {
    state: AppState,
}

impl App {
    pub fn new(animation: AnimationKind) -> Self {
        debug!("App::new: called");
        Self {
            state: AppState::new(animation),
        }
    }

    pub fn state(&self) -> &AppState {
        trace!("App::state: called");
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        trace!("App::state_mut: called");
        &mut self.state
    }

    /// Handle a key event
    ///
    /// Returns true if the application should exit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        debug!(?key, "App::handle_key: called");
        if key.kind != KeyEventKind::Press {
            return false;
        }

        let ctrl_c = key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL);
        if self.state.is_busy() {
            if ctrl_c {
                debug!("App::handle_key: cancel requested");
                self.state.cancel_requested = true;
            }
            self.handle_scroll_key(key.code);
            return false;
        }

        if ctrl_c || key.code == KeyCode::Esc {
            debug!("App::handle_key: quit");
            self.state.should_quit = true;
            return true;
        }

        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                if self.state.cursor > 0 {
                    let start = self.prev_char_boundary(self.state.cursor);
                    self.state.input.drain(start..self.state.cursor);
                    self.state.cursor = start;
                }
            }
            KeyCode::Delete => {
                if self.state.cursor < self.state.input.len() {
                    let end = self.next_char_boundary(self.state.cursor);
                    self.state.input.drain(self.state.cursor..end);
                }
            }
            KeyCode::Left => self.state.cursor = self.prev_char_boundary(self.state.cursor),
            KeyCode::Right => self.state.cursor = self.next_char_boundary(self.state.cursor),
            KeyCode::Home => self.state.cursor = 0,
            KeyCode::End => self.state.cursor = self.state.input.len(),
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.state.input.insert(self.state.cursor, c);
                self.state.cursor += c.len_utf8();
            }
            code => self.handle_scroll_key(code),
        }
        false
    }

    fn submit(&mut self) {
        let idea = self.state.input.trim();
        if idea.is_empty() {
            debug!("App::submit: empty idea");
            self.state.notice(EMPTY_IDEA);
            return;
        }
        debug!(%idea, "App::submit: queuing idea");
        self.state.pending_submit = Some(idea.to_string());
    }

    fn handle_scroll_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.state.scroll_up(1),
            KeyCode::Down => self.state.scroll_down(1),
            KeyCode::PageUp => self.state.scroll_up(PAGE),
            KeyCode::PageDown => self.state.scroll_down(PAGE),
            _ => {}
        }
    }

    fn prev_char_boundary(&self, pos: usize) -> usize {
        self.state.input[..pos].char_indices().last().map(|(i, _)| i).unwrap_or(0)
    }

    fn next_char_boundary(&self, pos: usize) -> usize {
        self.state.input[pos..]
            .chars()
            .next()
            .map(|c| pos + c.len_utf8())
            .unwrap_or(pos)
    }
}
