//! Animation variants and their frame sequences

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const SPINNER_GLYPHS: [char; 4] = ['-', '/', '|', '\\'];
const SPINNER_TICK: Duration = Duration::from_millis(100);

const MAX_DOTS: usize = 3;
const DOTS_TICK: Duration = Duration::from_millis(500);

const BAR_WIDTH: usize = 20;
const BAR_TICK: Duration = Duration::from_millis(100);

const TYPING_TICK: Duration = Duration::from_millis(100);
const TYPING_PAUSE: Duration = Duration::from_millis(700);
const TYPING_BLANK: Duration = Duration::from_millis(300);

/// Which progress animation to render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationKind {
    #[default]
    Spinner,
    Dots,
    Bar,
    Typing,
}

impl AnimationKind {
    /// All variants, in CLI help order
    pub const ALL: [AnimationKind; 4] = [Self::Spinner, Self::Dots, Self::Bar, Self::Typing];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spinner => "spinner",
            Self::Dots => "dots",
            Self::Bar => "bar",
            Self::Typing => "typing",
        }
    }

    /// Frame sequence for this variant with the given caption
    pub fn frames(&self, message: &str) -> Frames {
        debug!(?self, message_len = message.len(), "AnimationKind::frames: called");
        let state = match self {
            Self::Spinner => FrameState::Spinner { tick: 0 },
            Self::Dots => FrameState::Dots { dots: 0 },
            Self::Bar => FrameState::Bar {
                position: 0,
                direction: 1,
            },
            Self::Typing if message.is_empty() => {
                debug!("AnimationKind::frames: empty caption, typing falls back to dots");
                FrameState::Dots { dots: 0 }
            }
            Self::Typing => FrameState::Typing { revealed: 0 },
        };
        Frames {
            message: message.to_string(),
            state,
        }
    }
}

impl std::str::FromStr for AnimationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "AnimationKind::from_str: called");
        match s.to_lowercase().as_str() {
            "spinner" => Ok(Self::Spinner),
            "dots" => Ok(Self::Dots),
            "bar" => Ok(Self::Bar),
            "typing" => Ok(Self::Typing),
            _ => {
                debug!(%s, "AnimationKind::from_str: unknown animation");
                Err(format!("Unknown animation: {}. Use: spinner, dots, bar, or typing", s))
            }
        }
    }
}

impl std::fmt::Display for AnimationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One rendered line and how long it stays up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub text: String,
    pub hold: Duration,
}

#[derive(Debug, Clone)]
enum FrameState {
    Spinner { tick: usize },
    Dots { dots: usize },
    Bar { position: usize, direction: isize },
    /// `revealed` runs 0..=len, then len+1 is the blank frame
    Typing { revealed: usize },
}

/// Endless frame iterator for one animation instance
#[derive(Debug, Clone)]
pub struct Frames {
    message: String,
    state: FrameState,
}

impl Frames {
    fn with_caption(&self, body: &str, separator: &str) -> String {
        if self.message.is_empty() {
            body.to_string()
        } else {
            format!("{}{}{}", self.message, separator, body)
        }
    }
}

impl Iterator for Frames {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        let frame = match self.state {
            FrameState::Spinner { ref mut tick } => {
                let glyph = SPINNER_GLYPHS[*tick % SPINNER_GLYPHS.len()];
                *tick += 1;
                let body = format!("{} ", glyph);
                Frame {
                    text: self.with_caption(&body, " "),
                    hold: SPINNER_TICK,
                }
            }
            FrameState::Dots { ref mut dots } => {
                *dots = (*dots + 1) % (MAX_DOTS + 1);
                let body = format!("{}{}", ".".repeat(*dots), " ".repeat(MAX_DOTS - *dots));
                Frame {
                    text: self.with_caption(&body, ""),
                    hold: DOTS_TICK,
                }
            }
            FrameState::Bar {
                ref mut position,
                ref mut direction,
            } => {
                // Move first, then bounce off either end
                *position = position.saturating_add_signed(*direction);
                if *position >= BAR_WIDTH - 1 {
                    *direction = -1;
                } else if *position == 0 {
                    *direction = 1;
                }
                let body = format!(
                    "[{}={}]",
                    " ".repeat(*position),
                    " ".repeat(BAR_WIDTH - *position - 1)
                );
                Frame {
                    text: self.with_caption(&body, " "),
                    hold: BAR_TICK,
                }
            }
            FrameState::Typing { ref mut revealed } => {
                let len = self.message.chars().count();
                let frame = if *revealed <= len {
                    let prefix: String = self.message.chars().take(*revealed).collect();
                    let hold = if *revealed == len { TYPING_PAUSE } else { TYPING_TICK };
                    Frame { text: prefix, hold }
                } else {
                    Frame {
                        text: " ".repeat(len),
                        hold: TYPING_BLANK,
                    }
                };
                *revealed = (*revealed + 1) % (len + 2);
                frame
            }
        };
        Some(frame)
    }
}
