//! Terminal progress indicator
//!
//! Animations run on their own tokio task while the pipeline waits on the
//! generative text service, and are fully stopped before anything else is
//! written to the terminal.

mod animation;
mod indicator;
mod terminal;

pub use animation::{AnimationKind, Frame, Frames};
pub use indicator::{AnimationHandle, ProgressIndicator};
pub use terminal::{CaptureBuffer, Terminal};
