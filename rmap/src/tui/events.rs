//! TUI event handling
//!
//! Terminal input is polled on a plain thread and forwarded over a tokio
//! channel so the runner can `select!` on it next to the pipeline.

use std::time::Duration;

use crossterm::event::{self, KeyEvent};
use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Terminal events
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize(u16, u16),
    /// Nothing happened within one tick
    Tick,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Poll the terminal, emitting `Tick` whenever `tick_rate` passes quietly
    pub fn new(tick_rate: Duration) -> Self {
        debug!(?tick_rate, "EventHandler::new: called");
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::spawn(move || {
            debug!("EventHandler: polling thread started");
            loop {
                let event = match event::poll(tick_rate) {
                    Ok(true) => match event::read() {
                        Ok(event::Event::Key(key)) => Event::Key(key),
                        Ok(event::Event::Resize(w, h)) => Event::Resize(w, h),
                        Ok(_) => continue,
                        Err(e) => {
                            debug!(error = %e, "EventHandler: read failed, exiting");
                            break;
                        }
                    },
                    Ok(false) => Event::Tick,
                    Err(e) => {
                        debug!(error = %e, "EventHandler: poll failed, exiting");
                        break;
                    }
                };
                if tx.send(event).is_err() {
                    debug!("EventHandler: channel closed, exiting");
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Handler fed from a channel instead of the terminal
    #[cfg(test)]
    pub fn scripted() -> (mpsc::UnboundedSender<Event>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Next event; fails once the source is gone
    pub async fn next(&mut self) -> Result<Event> {
        let event = self.rx.recv().await.ok_or_else(|| eyre::eyre!("Event channel closed"))?;
        trace!(?event, "EventHandler::next: received");
        Ok(event)
    }
}
