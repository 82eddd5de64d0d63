// src/terminal/output.rs

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use crossterm::cursor::{
    Hide, MoveDown, MoveTo, MoveToColumn, MoveUp, RestorePosition, SavePosition, Show,
};
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use regex::Regex;
use tracing::debug;

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared handle to the UI output stream.
///
/// Cloning is cheap; every clone writes to the same sink. Write errors are
/// logged and otherwise ignored so a closed terminal never takes the
/// controller down.
#[derive(Clone)]
pub struct Terminal {
    sink: Sink,
    interactive: bool,
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

impl Terminal {
    pub fn stdout(interactive: bool) -> Self {
        Self::from_writer(io::stdout(), interactive)
    }

    pub fn from_writer(writer: impl Write + Send + 'static, interactive: bool) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
            interactive,
        }
    }

    /// A terminal writing into memory, for tests.
    pub fn capture(interactive: bool) -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::from_writer(buffer.clone(), interactive), buffer)
    }

    /// Banners, prompts and cursor control are only emitted when true.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn with_sink(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<()>) {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(err) = f(sink.as_mut()).and_then(|_| sink.flush()) {
            debug!("terminal write failed: {err}");
        }
    }

    pub fn write_str(&self, text: &str) {
        self.with_sink(|w| w.write_all(text.as_bytes()));
    }

    pub fn write_line(&self, text: &str) {
        self.with_sink(|w| {
            w.write_all(text.as_bytes())?;
            w.write_all(b"\n")
        });
    }

    /// Clear the screen and scrollback and home the cursor.
    pub fn clear_screen(&self) {
        self.with_sink(|w| {
            w.queue(Clear(ClearType::All))?
                .queue(Clear(ClearType::Purge))?
                .queue(MoveTo(0, 0))?;
            Ok(())
        });
    }

    pub fn hide_cursor(&self) {
        self.with_sink(|w| w.queue(Hide).map(|_| ()));
    }

    pub fn show_cursor(&self) {
        self.with_sink(|w| w.queue(Show).map(|_| ()));
    }

    pub fn cursor_up(&self, rows: u16) {
        self.with_sink(|w| w.queue(MoveUp(rows)).map(|_| ()));
    }

    pub fn cursor_down(&self, rows: u16) {
        self.with_sink(|w| w.queue(MoveDown(rows)).map(|_| ()));
    }

    pub fn save_cursor(&self) {
        self.with_sink(|w| w.queue(SavePosition).map(|_| ()));
    }

    pub fn restore_cursor(&self) {
        self.with_sink(|w| w.queue(RestorePosition).map(|_| ()));
    }

    pub fn erase_down(&self) {
        self.with_sink(|w| w.queue(Clear(ClearType::FromCursorDown)).map(|_| ()));
    }

    /// Erase the current line and return to its first column.
    pub fn erase_line(&self) {
        self.with_sink(|w| {
            w.queue(Clear(ClearType::CurrentLine))?.queue(MoveToColumn(0))?;
            Ok(())
        });
    }
}

static ANSI_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").ok());

/// In-memory sink returned by [`Terminal::capture`].
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    /// Raw output, escape sequences included.
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Output with ANSI escape sequences removed.
    pub fn plain(&self) -> String {
        let raw = self.contents();
        match ANSI_RE.as_ref() {
            Some(re) => re.replace_all(&raw, "").into_owned(),
            None => raw,
        }
    }

    pub fn clear(&self) {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
