//! ProgressIndicator - renders an animation while a stage is blocked

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{AnimationKind, Terminal};

/// How long `stop` waits for the render task to acknowledge
const STOP_GRACE: Duration = Duration::from_secs(1);

/// Lifecycle of one running animation
#[derive(Debug)]
pub struct AnimationHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// A single-line terminal animation driven by its own task
///
/// `start` returns immediately; `stop` blocks the caller until the render
/// task has exited (or the grace period ran out) and the line is erased, so
/// the next write to the terminal never interleaves with a frame.
#[derive(Debug)]
pub struct ProgressIndicator {
    kind: AnimationKind,
    message: String,
    terminal: Terminal,
    handle: Option<AnimationHandle>,
}

impl ProgressIndicator {
    pub fn new(kind: AnimationKind, message: impl Into<String>, terminal: Terminal) -> Self {
        let message = message.into();
        debug!(?kind, %message, "ProgressIndicator::new: called");
        Self {
            kind,
            message,
            terminal,
            handle: None,
        }
    }

    /// Whether a render task is currently live
    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Spawn the render task; must be called inside a tokio runtime
    pub fn start(&mut self) {
        debug!(kind = ?self.kind, "ProgressIndicator::start: called");
        if self.handle.is_some() {
            debug!("ProgressIndicator::start: already running, ignoring");
            return;
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let frames = self.kind.frames(&self.message);
        let terminal = self.terminal.clone();
        let task = tokio::spawn(render_loop(frames, terminal, stop_rx));

        self.handle = Some(AnimationHandle { stop_tx, task });
    }

    /// Signal the render task, wait for it, then erase the line
    ///
    /// A no-op when the indicator was never started.
    pub async fn stop(&mut self) {
        let Some(AnimationHandle { stop_tx, mut task }) = self.handle.take() else {
            debug!("ProgressIndicator::stop: not running");
            return;
        };
        debug!(kind = ?self.kind, "ProgressIndicator::stop: called");

        let _ = stop_tx.send(true);
        match tokio::time::timeout(STOP_GRACE, &mut task).await {
            Ok(Ok(())) => debug!("ProgressIndicator::stop: render task exited"),
            Ok(Err(e)) => warn!(error = %e, "ProgressIndicator::stop: render task failed"),
            Err(_) => {
                warn!("ProgressIndicator::stop: render task did not acknowledge, aborting");
                task.abort();
                let _ = task.await;
            }
        }

        if let Err(e) = self.terminal.clear_line() {
            debug!(error = %e, "ProgressIndicator::stop: failed to clear line");
        }
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        // Dropped without stop(), e.g. the stage future was cancelled
        if let Some(handle) = self.handle.take() {
            debug!(kind = ?self.kind, "ProgressIndicator::drop: still running, aborting");
            let _ = handle.stop_tx.send(true);
            handle.task.abort();
            // The render task re-checks the stop flag under the terminal lock,
            // so no frame can land after this
            if let Err(e) = self.terminal.clear_line() {
                debug!(error = %e, "ProgressIndicator::drop: failed to clear line");
            }
        }
    }
}

/// Draw frames until told to stop; the stop flag is checked once per frame
async fn render_loop(frames: super::Frames, terminal: Terminal, mut stop_rx: watch::Receiver<bool>) {
    for frame in frames {
        match terminal.draw_line_if(&frame.text, || !*stop_rx.borrow()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                debug!(error = %e, "render_loop: write failed, stopping animation");
                break;
            }
        }
        tokio::select! {
            _ = tokio::time::sleep(frame.hold) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let (terminal, buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Spinner, "Working", terminal);

        indicator.stop().await;

        assert!(!indicator.is_running());
        assert_eq!(buf.contents(), "");
    }

    #[tokio::test]
    async fn test_start_renders_and_stop_clears() {
        let (terminal, buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Spinner, "Working", terminal);

        indicator.start();
        assert!(indicator.is_running());
        tokio::time::sleep(Duration::from_millis(250)).await;
        indicator.stop().await;

        assert!(!indicator.is_running());
        let out = buf.contents();
        assert!(out.starts_with("\rWorking - "));
        assert!(out.contains("Working / "));
        // Clearing is the very last thing written
        assert!(out.ends_with("\x1b[1G\x1b[2K"));
    }

    #[tokio::test]
    async fn test_nothing_written_after_stop_returns() {
        let (terminal, buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Bar, "", terminal);

        indicator.start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        indicator.stop().await;
        let snapshot = buf.contents();

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(buf.contents(), snapshot);
    }

    #[tokio::test]
    async fn test_stop_is_prompt_for_slow_frames() {
        let (terminal, _buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Dots, "Waiting", terminal);

        indicator.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let started = std::time::Instant::now();
        indicator.stop().await;
        // Stop interrupts the 500ms hold instead of waiting it out
        assert!(started.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_double_start_keeps_single_task() {
        let (terminal, _buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Typing, "abc", terminal);

        indicator.start();
        indicator.start();
        assert!(indicator.is_running());
        indicator.stop().await;
        assert!(!indicator.is_running());
    }

    #[tokio::test]
    async fn test_drop_while_running_clears_line() {
        let (terminal, buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Spinner, "Working", terminal);

        indicator.start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        drop(indicator);
        let snapshot = buf.contents();

        assert!(snapshot.contains("Working"));
        assert!(snapshot.ends_with("\x1b[1G\x1b[2K"));
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(buf.contents(), snapshot);
    }

    #[tokio::test]
    async fn test_drop_without_start_writes_nothing() {
        let (terminal, buf) = Terminal::capture();
        drop(ProgressIndicator::new(AnimationKind::Bar, "", terminal));
        assert_eq!(buf.contents(), "");
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let (terminal, buf) = Terminal::capture();
        let mut indicator = ProgressIndicator::new(AnimationKind::Spinner, "", terminal);

        indicator.start();
        indicator.stop().await;
        indicator.start();
        tokio::time::sleep(Duration::from_millis(20)).await;
        indicator.stop().await;

        assert_eq!(buf.contents().matches("\x1b[2K").count(), 2);
    }
}
