//! TUI Runner - main loop that owns the terminal and drives the pipeline
//!
//! The runner is responsible for:
//! - Drawing the UI on every event
//! - Dispatching key events to App
//! - Running the pipeline for a submitted idea while keeping the screen live,
//!   feeding reporter messages into the status pane

use std::time::Instant;

use eyre::Result;
use ratatui::Terminal;
use ratatui::backend::Backend;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::app::App;
use super::events::{Event, EventHandler};
use super::views;
use crate::pipeline::{Idea, Pipeline, ReporterError};
use crate::progress::AnimationKind;

pub struct TuiRunner<B: Backend> {
    app: App,
    terminal: Terminal<B>,
    event_handler: EventHandler,
    pipeline: Pipeline,
}

impl<B: Backend> TuiRunner<B> {
    /// The pipeline should write its own animation to `Terminal::sink()`;
    /// the status pane draws progress instead
    pub fn new(terminal: Terminal<B>, event_handler: EventHandler, pipeline: Pipeline, animation: AnimationKind) -> Self {
        debug!(?animation, "TuiRunner::new: called");
        Self {
            app: App::new(animation),
            terminal,
            event_handler,
            pipeline,
        }
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Run until the user quits
    pub async fn run(&mut self) -> Result<()> {
        debug!("TuiRunner::run: entering main loop");
        loop {
            self.draw()?;

            match self.event_handler.next().await? {
                Event::Key(key) => {
                    if self.app.handle_key(key) {
                        break;
                    }
                }
                Event::Resize(width, height) => debug!(width, height, "TuiRunner::run: resize"),
                Event::Tick => {}
            }

            if let Some(idea) = self.app.state_mut().pending_submit.take() {
                self.generate(&idea).await?;
            }

            if self.app.state().should_quit {
                debug!("TuiRunner::run: should_quit is true, breaking");
                break;
            }
        }
        debug!("TuiRunner::run: exiting");
        Ok(())
    }

    /// Run the pipeline on one idea; the outcome lands in the app state
    ///
    /// Pipeline failures are shown, not returned. Only terminal and event
    /// source failures end the TUI.
    pub async fn generate(&mut self, idea: &str) -> Result<()> {
        debug!(%idea, "TuiRunner::generate: called");
        let idea = match Idea::new(idea) {
            Ok(idea) => idea,
            Err(e) => {
                self.app.state_mut().fail_run(e.to_string());
                return Ok(());
            }
        };

        self.app.state_mut().begin_run();
        let (status_tx, mut status_rx) = mpsc::unbounded_channel::<String>();
        let mut reporter = move |message: &str| -> Result<(), ReporterError> {
            status_tx.send(message.to_string())?;
            Ok(())
        };

        let app = &mut self.app;
        let terminal = &mut self.terminal;
        let events = &mut self.event_handler;
        let run = self.pipeline.run(&idea, &mut reporter);
        tokio::pin!(run);

        let outcome = loop {
            terminal
                .draw(|frame| views::render(app.state(), frame))
                .map_err(|e| eyre::eyre!("Failed to draw: {}", e))?;

            tokio::select! {
                result = &mut run => break Some(result),
                Some(message) = status_rx.recv() => app.state_mut().report(&message),
                event = events.next() => match event? {
                    Event::Key(key) => {
                        app.handle_key(key);
                        if app.state().cancel_requested {
                            break None;
                        }
                    }
                    Event::Resize(..) => {}
                    Event::Tick => app.state_mut().tick(Instant::now()),
                },
            }
        };

        while let Ok(message) = status_rx.try_recv() {
            app.state_mut().report(&message);
        }

        match outcome {
            Some(Ok(result)) => {
                info!(len = result.text.len(), "TUI run complete");
                app.state_mut().finish_run(result.text);
            }
            Some(Err(e)) => {
                warn!(error = %e, "TUI run failed");
                app.state_mut().fail_run(format!("Error: {}", e));
            }
            None => {
                info!("TUI run cancelled");
                app.state_mut().fail_run("Generation cancelled.");
            }
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| views::render(app.state(), frame))
            .map_err(|e| eyre::eyre!("Failed to draw: {}", e))?;
        Ok(())
    }
}
