//! TUI application state
//!
//! Pure data for the full-screen front end. No rendering logic here.

use std::time::Instant;

use tracing::debug;

use crate::pipeline::status::{DRAFT_COMPLETE, GENERATION_COMPLETE};
use crate::pipeline::{DRAFT_CAPTION, REFINE_CAPTION};
use crate::progress::{AnimationKind, Frame, Frames};

pub const WELCOME: &str = "Describe your app idea and press Enter.";
pub const STARTING: &str = "Starting roadmap generation process...";
pub const EMPTY_IDEA: &str = "Please enter an app idea first.";
pub const READY: &str = "✅ Roadmap generation complete! Ready for your next idea.";

/// The animation shown in the status pane while a stage runs
#[derive(Debug)]
pub struct Activity {
    frames: Frames,
    current: Frame,
    shown_at: Instant,
}

impl Activity {
    fn new(kind: AnimationKind, caption: &str) -> Self {
        let mut frames = kind.frames(caption);
        let current = frames.next().unwrap_or(Frame {
            text: caption.to_string(),
            hold: std::time::Duration::MAX,
        });
        Self {
            frames,
            current,
            shown_at: Instant::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.current.text
    }

    /// Move to the next frame once the current one has been up long enough
    fn tick(&mut self, now: Instant) {
        if now.duration_since(self.shown_at) < self.current.hold {
            return;
        }
        if let Some(frame) = self.frames.next() {
            self.current = frame;
            self.shown_at = now;
        }
    }
}

/// Everything the views draw
#[derive(Debug)]
pub struct AppState {
    /// Idea being typed
    pub input: String,
    /// Byte offset of the cursor in `input`
    pub cursor: usize,
    /// Latest status message
    pub status: String,
    /// Set when the last run failed
    pub failed: bool,
    /// Finished roadmap, markdown
    pub roadmap: String,
    /// Vertical scroll of the roadmap pane
    pub scroll: u16,
    /// Live while a run is in progress
    pub activity: Option<Activity>,
    /// Idea submitted with Enter, waiting for the runner
    pub pending_submit: Option<String>,
    /// Cancel request for the run in progress
    pub cancel_requested: bool,
    pub should_quit: bool,
    animation: AnimationKind,
}

impl AppState {
    pub fn new(animation: AnimationKind) -> Self {
        debug!(?animation, "AppState::new: called");
        Self {
            input: String::new(),
            cursor: 0,
            status: WELCOME.to_string(),
            failed: false,
            roadmap: String::new(),
            scroll: 0,
            activity: None,
            pending_submit: None,
            cancel_requested: false,
            should_quit: false,
            animation,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.activity.is_some()
    }

    /// A run has started
    pub fn begin_run(&mut self) {
        debug!("AppState::begin_run: called");
        self.status = STARTING.to_string();
        self.failed = false;
        self.cancel_requested = false;
        self.activity = Some(Activity::new(self.animation, DRAFT_CAPTION));
    }

    /// A message from the pipeline's status reporter
    pub fn report(&mut self, message: &str) {
        debug!(%message, "AppState::report: called");
        self.status = message.to_string();
        if message == DRAFT_COMPLETE && self.activity.is_some() {
            self.activity = Some(Activity::new(self.animation, REFINE_CAPTION));
        }
    }

    pub fn finish_run(&mut self, roadmap: String) {
        debug!(len = roadmap.len(), "AppState::finish_run: called");
        self.activity = None;
        self.roadmap = roadmap;
        self.scroll = 0;
        if self.status == GENERATION_COMPLETE {
            self.status = READY.to_string();
        }
    }

    pub fn fail_run(&mut self, error: impl Into<String>) {
        let error = error.into();
        debug!(%error, "AppState::fail_run: called");
        self.activity = None;
        self.failed = true;
        self.status = error;
    }

    /// Notice that is not tied to a run
    pub fn notice(&mut self, message: &str) {
        self.failed = false;
        self.status = message.to_string();
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(activity) = self.activity.as_mut() {
            activity.tick(now);
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.roadmap.lines().count().saturating_sub(1);
        let max = u16::try_from(max).unwrap_or(u16::MAX);
        self.scroll = self.scroll.saturating_add(lines).min(max);
    }
}
