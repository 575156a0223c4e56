use crossterm::{ExecutableCommand, terminal};
use std::io;
use std::io::Write;

/// Keeps the terminal in raw mode while alive, restores it on drop.
#[must_use = "the terminal leaves raw mode as soon as the lock is dropped"]
pub struct RawLock {
    enabled: bool,
}

impl RawLock {
    /// False if the terminal could not be switched, e.g. when stdout is redirected.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Drop for RawLock {
    fn drop(&mut self) {
        if !self.enabled {
            return;
        }
        // terminal stays in raw mode but no means to repair
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("Error resetting terminal {e}");
        }
    }
}

/// Set terminal to raw in best-effort mode, only log on failure, since it does not work
/// without a controlling terminal, e.g. with redirected input or in tests.
pub fn set_terminal_raw(mut stdout: impl Write) -> RawLock {
    let switched = terminal::enable_raw_mode()
        .and_then(|()| stdout.execute(terminal::EnableLineWrap).map(|_| ()));
    match switched {
        Ok(()) => {
            log::debug!("Terminal switched to raw mode");
            RawLock { enabled: true }
        }
        Err(e) => {
            log::warn!("Could not set terminal to raw mode: {e}");
            // raw mode may be half set up, the lock still has to undo it
            RawLock {
                enabled: terminal::is_raw_mode_enabled().unwrap_or(false),
            }
        }
    }
}

/// Program output for a terminal in raw mode, where a line feed no longer returns the
/// cursor to the first column.
///
/// Bytes pass through unchanged until [`TerminalOutput::set_raw`] turns on the
/// translation of `\n` to `\r\n`.
pub struct TerminalOutput<W: Write> {
    inner: W,
    raw: bool,
}

impl<W: Write> TerminalOutput<W> {
    pub const fn new(inner: W) -> Self {
        Self { inner, raw: false }
    }
    /// Follows the terminal mode, see [`RawLock::is_enabled`].
    pub const fn set_raw(&mut self, raw: bool) {
        self.raw = raw;
    }
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for TerminalOutput<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.raw {
            return self.inner.write(buf);
        }
        let mut written = 0;
        for part in buf.split_inclusive(|b| *b == b'\n') {
            match part.split_last() {
                Some((&b'\n', line)) => {
                    self.inner.write_all(line)?;
                    self.inner.write_all(b"\r\n")?;
                }
                _ => self.inner.write_all(part)?,
            }
            written += part.len();
        }
        Ok(written)
    }
    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
