use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, poll, read};
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

/// Providing Keyboard Input independent of an implementation.
pub trait KeyboardInputProvider {
    /// Checks if input is available, does not block.
    ///
    /// # Errors
    /// - polling the underlying device failed
    fn check_input_available(&mut self) -> io::Result<bool>;
    /// Consumes the next character, blocking until one is available.
    ///
    /// # Errors
    /// - reading the underlying device failed
    /// - CTRL-C was triggered while waiting, with [`io::ErrorKind::Interrupted`]
    fn read_input_character(&mut self) -> io::Result<u8>;
    /// True if CTRL-C was triggered
    fn is_interrupted(&self) -> bool;
}

/// Keyboard backed by the crossterm event queue of the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalInputProvider {
    pending: VecDeque<u8>,
    is_interrupted: bool,
}

impl TerminalInputProvider {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            is_interrupted: false,
        }
    }

    /// Moves a key press into the pending queue. Returns `false` for events that do not
    /// produce a character.
    fn handle_event(&mut self, event: &Event) -> bool {
        let Some(key) = event.as_key_press_event() else {
            return false;
        };
        if is_ctrl_c(&key) {
            log::debug!("CTRL-C received");
            self.is_interrupted = true;
            return false;
        }
        key_to_byte(&key).is_some_and(|b| {
            self.pending.push_back(b);
            true
        })
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn key_to_byte(key: &KeyEvent) -> Option<u8> {
    match key.code {
        KeyCode::Char(c) if c.is_ascii() => u8::try_from(c).ok(),
        KeyCode::Enter => Some(b'\n'),
        KeyCode::Tab => Some(b'\t'),
        KeyCode::Backspace => Some(0x08),
        KeyCode::Esc => Some(0x1B),
        _ => None,
    }
}

impl KeyboardInputProvider for TerminalInputProvider {
    fn check_input_available(&mut self) -> io::Result<bool> {
        while self.pending.is_empty() && poll(Duration::from_secs(0))? {
            let event = read()?;
            self.handle_event(&event);
        }
        Ok(!self.pending.is_empty())
    }
    fn read_input_character(&mut self) -> io::Result<u8> {
        loop {
            if let Some(b) = self.pending.pop_front() {
                return Ok(b);
            }
            let event = read()?;
            if !self.handle_event(&event) && self.is_interrupted {
                return Err(io::Error::new(
                    io::ErrorKind::Interrupted,
                    "CTRL-C while waiting for input",
                ));
            }
        }
    }
    fn is_interrupted(&self) -> bool {
        self.is_interrupted
    }
}
