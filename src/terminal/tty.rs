// src/terminal/tty.rs

use std::io::{self, IsTerminal};
use std::time::Duration;

use crossterm::event::{self, Event};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::engine::WatchEvent;
use crate::terminal::keys::Key;

/// Whether the UI should behave interactively: stdout is a terminal, the
/// terminal is not `dumb`, and we are not running under CI.
pub fn is_interactive(ci_flag: bool) -> bool {
    if ci_flag || is_ci_env() {
        return false;
    }
    let dumb = std::env::var("TERM").is_ok_and(|t| t == "dumb");
    io::stdout().is_terminal() && !dumb
}

fn is_ci_env() -> bool {
    std::env::var("CI").is_ok_and(|v| !v.is_empty() && v != "false" && v != "0")
}

/// Whether stdin can deliver single keystrokes.
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

/// Raw mode for the lifetime of the guard.
#[derive(Debug)]
pub struct RawModeGuard {
    enabled: bool,
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { enabled: true })
    }

    pub fn disable(&mut self) {
        if self.enabled {
            self.enabled = false;
            if let Err(err) = disable_raw_mode() {
                warn!("failed to leave raw mode: {err}");
            }
        }
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        self.disable();
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Read keystrokes on the blocking pool and forward them as
/// [`WatchEvent::Key`]. The reader stops once the receiver is dropped.
pub fn spawn_key_reader(tx: mpsc::UnboundedSender<WatchEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        loop {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key_event)) => {
                        let Some(key) = Key::from_event(&key_event) else {
                            continue;
                        };
                        if tx.send(WatchEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!("failed to read key event: {err}");
                        break;
                    }
                },
                Ok(false) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(err) => {
                    warn!("failed to poll terminal events: {err}");
                    break;
                }
            }
        }
        debug!("key reader stopped");
    })
}
