//! Shared handle to the process output stream

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crossterm::{QueueableCommand, cursor, terminal};

/// Cloneable handle to the one output stream that the animation, status
/// messages, and input prompts take turns writing to.
///
/// Turn-taking is the pipeline's job; the mutex only makes the handle
/// shareable across the render task.
#[derive(Clone)]
pub struct Terminal {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Terminal {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// Process stdout
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    /// Discard everything
    pub fn sink() -> Self {
        Self::new(Box::new(io::sink()))
    }

    /// In-memory terminal plus a buffer to inspect what was written
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::new(Box::new(buffer.clone())), buffer)
    }

    /// Overwrite the current line with `text` (no newline)
    pub fn draw_line(&self, text: &str) -> io::Result<()> {
        self.draw_line_if(text, || true).map(|_| ())
    }

    /// Like `draw_line`, but `keep` is checked while the stream is held so a
    /// concurrent `clear_line` can never be followed by a stale frame
    pub fn draw_line_if<F>(&self, text: &str, keep: F) -> io::Result<bool>
    where
        F: FnOnce() -> bool,
    {
        let mut drawn = false;
        self.with_writer(|w| {
            if !keep() {
                return Ok(());
            }
            write!(w, "\r{}", text)?;
            drawn = true;
            w.flush()
        })?;
        Ok(drawn)
    }

    /// Erase the current line and park the cursor at column 0
    pub fn clear_line(&self) -> io::Result<()> {
        self.with_writer(|w| {
            w.queue(cursor::MoveToColumn(0))?
                .queue(terminal::Clear(terminal::ClearType::CurrentLine))?;
            w.flush()
        })
    }

    /// Write a full line
    pub fn write_line(&self, text: &str) -> io::Result<()> {
        self.with_writer(|w| {
            writeln!(w, "{}", text)?;
            w.flush()
        })
    }

    fn with_writer<F>(&self, f: F) -> io::Result<()>
    where
        F: FnOnce(&mut dyn Write) -> io::Result<()>,
    {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("terminal writer poisoned"))?;
        f(guard.as_mut())
    }
}

impl std::fmt::Debug for Terminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Terminal").finish_non_exhaustive()
    }
}

/// Byte buffer behind `Terminal::capture`
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .map_err(|_| io::Error::other("capture buffer poisoned"))?
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
